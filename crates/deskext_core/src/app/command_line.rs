//! Minimal command-line switch list handed to lifecycle delegates.

/// Ordered command-line switches (`--name` or `--name=value`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    switches: Vec<(String, Option<String>)>,
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `--name` and `--name=value` arguments; other arguments are ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut command_line = Self::new();
        for arg in args {
            let Some(switch) = arg.as_ref().strip_prefix("--") else {
                continue;
            };
            match switch.split_once('=') {
                Some((name, value)) => command_line.append_switch_with_value(name, value),
                None => command_line.append_switch(switch),
            }
        }
        command_line
    }

    pub fn append_switch(&mut self, name: &str) {
        self.switches.push((name.to_string(), None));
    }

    pub fn append_switch_with_value(&mut self, name: &str, value: &str) {
        self.switches.push((name.to_string(), Some(value.to_string())));
    }

    pub fn has_switch(&self, name: &str) -> bool {
        self.switches.iter().any(|(switch, _)| switch == name)
    }

    /// Value of the last occurrence of `name`, or `""`.
    pub fn switch_value(&self, name: &str) -> &str {
        self.switches
            .iter()
            .rev()
            .find(|(switch, _)| switch == name)
            .and_then(|(_, value)| value.as_deref())
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }
}
