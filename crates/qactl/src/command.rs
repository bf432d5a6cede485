//! Command Grammar
//!
//! Every chat command is one row in `COMMANDS`: its kind, the spellings it
//! answers to and how many arguments it takes. `parse` is the only
//! dispatcher; the last argument always takes the rest of the line.

/// Kinds of knowledge base commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Add,
    Delete,
    List,
    Compare,
    On,
    Off,
    Help,
}

#[derive(Debug)]
pub struct CommandSpec {
    pub kind: CommandKind,
    /// Accepted spellings; ASCII names match case-insensitively
    pub names: &'static [&'static str],
    pub min_args: usize,
    pub max_args: usize,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        kind: CommandKind::Add,
        names: &["qaadd", "qa-add", "添加知识库", "添加问答"],
        min_args: 2,
        max_args: 2,
        usage: "qaadd <问题> <答案>",
    },
    CommandSpec {
        kind: CommandKind::Delete,
        names: &["qadel", "qa-del", "qadelete", "删除知识库", "删除问答"],
        min_args: 1,
        max_args: 1,
        usage: "qadel <问题>",
    },
    CommandSpec {
        kind: CommandKind::List,
        names: &["qalist", "qa-list", "知识库列表", "查看知识库"],
        min_args: 0,
        max_args: 1,
        usage: "qalist [页码]",
    },
    CommandSpec {
        kind: CommandKind::Compare,
        names: &["qacompare", "qa-compare", "qacmp", "问答比较"],
        min_args: 2,
        max_args: 2,
        usage: "qacmp <文本1> <文本2>",
    },
    CommandSpec {
        kind: CommandKind::On,
        names: &["qaon", "qa-on", "开启知识库", "开启问答"],
        min_args: 0,
        max_args: 0,
        usage: "qaon",
    },
    CommandSpec {
        kind: CommandKind::Off,
        names: &["qaoff", "qa-off", "关闭知识库", "关闭问答"],
        min_args: 0,
        max_args: 0,
        usage: "qaoff",
    },
    CommandSpec {
        kind: CommandKind::Help,
        names: &["qahelp", "qa-help", "知识库帮助", "问答帮助"],
        min_args: 0,
        max_args: 0,
        usage: "qahelp",
    },
];

/// A parsed command with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub args: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub enum ParseOutcome {
    /// Ordinary chat text
    NotCommand,
    Command(Command),
    /// Recognized command with the wrong number of arguments
    Usage(&'static CommandSpec),
}

impl PartialEq for CommandSpec {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

pub fn spec_for(kind: CommandKind) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.kind == kind)
}

/// Strip a command name from the front of `text`, returning the remainder
fn strip_name<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let head = text.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }

    let rest = &text[name.len()..];
    // "qaaddx" is a word, "qaadd问题" is a command glued to its argument
    let glued_ascii = name.is_ascii()
        && rest
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric());
    if glued_ascii {
        return None;
    }
    Some(rest)
}

/// Split into at most `max` whitespace-separated args, the last one greedy
fn split_args(rest: &str, max: usize) -> Vec<String> {
    let mut args = Vec::new();
    let mut rest = rest.trim();

    while !rest.is_empty() && args.len() + 1 < max {
        match rest.find(char::is_whitespace) {
            Some(idx) => {
                args.push(rest[..idx].to_string());
                rest = rest[idx..].trim_start();
            }
            None => {
                args.push(rest.to_string());
                rest = "";
            }
        }
    }

    if !rest.is_empty() {
        args.push(rest.to_string());
    }
    args
}

/// Parse raw chat text against the command table
pub fn parse(raw: &str) -> ParseOutcome {
    let text = raw.trim();

    // Longest spelling first so "qadelete" is not read as "qadel" + "ete"
    let matched = COMMANDS
        .iter()
        .flat_map(|spec| spec.names.iter().map(move |name| (spec, *name)))
        .filter_map(|(spec, name)| strip_name(text, name).map(|rest| (spec, name, rest)))
        .max_by_key(|(_, name, _)| name.len());

    let Some((spec, _, rest)) = matched else {
        return ParseOutcome::NotCommand;
    };

    if spec.max_args == 0 {
        // "开启知识库了吗" is a question, not a toggle
        return if rest.trim().is_empty() {
            ParseOutcome::Command(Command {
                kind: spec.kind,
                args: Vec::new(),
            })
        } else {
            ParseOutcome::NotCommand
        };
    }

    let args = split_args(rest, spec.max_args);
    if args.len() < spec.min_args {
        return ParseOutcome::Usage(spec);
    }

    ParseOutcome::Command(Command {
        kind: spec.kind,
        args,
    })
}
