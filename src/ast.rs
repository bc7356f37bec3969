/// Parsed command line, consumed read-only by the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandTree {
    Simple(SimpleCommand),
    Compound {
        op: Operator,
        left: Box<CommandTree>,
        right: Box<CommandTree>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Sequential,         // ;
    Parallel,           // &
    Pipe,               // |
    ConditionalZero,    // &&
    ConditionalNonZero, // ||
}

impl CommandTree {
    pub fn compound(op: Operator, left: CommandTree, right: CommandTree) -> Self {
        CommandTree::Compound {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `None` for a leaf.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            CommandTree::Simple(_) => None,
            CommandTree::Compound { op, .. } => Some(*op),
        }
    }
}

impl From<SimpleCommand> for CommandTree {
    fn from(cmd: SimpleCommand) -> Self {
        CommandTree::Simple(cmd)
    }
}

/// A verb as a chain of token parts. An assignment such as `FOO=bar`
/// arrives as `["FOO", "=", "bar"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbForm {
    Name(String),
    Assignment {
        name: String,
        value: Option<String>,
    },
}

impl Word {
    pub fn new(text: &str) -> Self {
        Word {
            parts: vec![text.to_string()],
        }
    }

    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Word {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn text(&self) -> String {
        self.parts.concat()
    }

    pub fn form(&self) -> VerbForm {
        match self.parts.as_slice() {
            [name, eq, rest @ ..] if eq == "=" => VerbForm::Assignment {
                name: name.clone(),
                value: if rest.is_empty() { None } else { Some(rest.concat()) },
            },
            _ => VerbForm::Name(self.text()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    pub verb: Word,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub append_stdout: bool,
    pub append_stderr: bool,
}

impl SimpleCommand {
    pub fn new(verb: &str) -> Self {
        Self::with_verb(Word::new(verb))
    }

    pub fn with_verb(verb: Word) -> Self {
        SimpleCommand {
            verb,
            args: Vec::new(),
            stdin: None,
            stdout: None,
            stderr: None,
            append_stdout: false,
            append_stderr: false,
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin_from(mut self, path: &str) -> Self {
        self.stdin = Some(path.to_string());
        self
    }

    pub fn stdout_to(mut self, path: &str, append: bool) -> Self {
        self.stdout = Some(path.to_string());
        self.append_stdout = append;
        self
    }

    pub fn stderr_to(mut self, path: &str, append: bool) -> Self {
        self.stderr = Some(path.to_string());
        self.append_stderr = append;
        self
    }

    /// argv for exec: the verb text followed by the arguments.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.verb.text());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_verb_is_name() {
        assert_eq!(Word::new("ls").form(), VerbForm::Name("ls".to_string()));
    }

    #[test]
    fn test_assignment_form() {
        let w = Word::from_parts(["FOO", "=", "bar"]);
        assert_eq!(
            w.form(),
            VerbForm::Assignment {
                name: "FOO".to_string(),
                value: Some("bar".to_string()),
            }
        );
    }

    #[test]
    fn test_assignment_without_value() {
        let w = Word::from_parts(["FOO", "="]);
        assert_eq!(
            w.form(),
            VerbForm::Assignment {
                name: "FOO".to_string(),
                value: None,
            }
        );
    }

    #[test]
    fn test_multi_part_verb_without_equals_is_concatenated() {
        let w = Word::from_parts(["ec", "ho"]);
        assert_eq!(w.form(), VerbForm::Name("echo".to_string()));
    }

    #[test]
    fn test_argv_starts_with_verb() {
        let cmd = SimpleCommand::new("echo").arg("a").arg("b");
        assert_eq!(cmd.argv(), vec!["echo", "a", "b"]);
    }

    #[test]
    fn test_operator_of_leaf_and_compound() {
        let leaf: CommandTree = SimpleCommand::new("true").into();
        assert_eq!(leaf.operator(), None);
        let seq = CommandTree::compound(Operator::Sequential, leaf.clone(), leaf);
        assert_eq!(seq.operator(), Some(Operator::Sequential));
    }
}
