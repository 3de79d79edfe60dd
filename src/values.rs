//! Named value substitution.
//!
//! Values are declared with `-V name,value` on the command line or with a
//! `\val name value` directive inside the script. A script refers to a value
//! by its wrapped token `##name##`; only that exact token is rewritten, a bare
//! `name` in the text is left alone.

use crate::error::{Result, ScriptError};

const DELIMITER: &str = "##";

/// Wrap a value name in the substitution delimiter.
pub fn wrap_name(name: &str) -> String {
    format!("{DELIMITER}{name}{DELIMITER}")
}

/// Ordered table of wrapped names and their replacement strings.
///
/// Names are unique. Re-adding a name overwrites its value in place and keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueStore {
    pairs: Vec<(String, String)>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `name,value` seed strings.
    ///
    /// Stops at the first malformed seed.
    pub fn from_seeds<I, S>(seeds: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut store = Self::new();
        for seed in seeds {
            store.add_seed(seed.as_ref())?;
        }
        Ok(store)
    }

    /// Insert or update a value.
    pub fn add(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || value.is_empty() {
            return Err(ScriptError::invalid_argument(format!(
                "value name or value is empty (name: {name:?}, value: {value:?})"
            )));
        }

        let wrapped = wrap_name(name);
        match self.pairs.iter_mut().find(|(n, _)| *n == wrapped) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.pairs.push((wrapped, value.to_string())),
        }
        Ok(())
    }

    /// Parse and add a `name,value` seed.
    pub fn add_seed(&mut self, seed: &str) -> Result<()> {
        let parts: Vec<&str> = seed.split(',').collect();
        match parts.as_slice() {
            [name, value] => self.add(name, value),
            _ => Err(ScriptError::parse(format!(
                "value must be in format name,value (got {seed:?})"
            ))),
        }
    }

    /// Look up a value by its bare name.
    pub fn get(&self, name: &str) -> Option<&str> {
        let wrapped = wrap_name(name);
        self.pairs
            .iter()
            .find(|(n, _)| *n == wrapped)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Snapshot the current pairs into a substitution function.
    ///
    /// Later changes to the store do not affect a replacer already built.
    pub fn replacer(&self) -> Replacer {
        Replacer {
            pairs: self.pairs.clone(),
        }
    }
}

/// Immutable multi-pattern string replacer.
#[derive(Debug, Clone, Default)]
pub struct Replacer {
    pairs: Vec<(String, String)>,
}

impl Replacer {
    /// Replace every wrapped name in `input` in a single left-to-right scan.
    ///
    /// At each position the first declared pattern that matches wins. Inserted
    /// values are copied verbatim and never scanned again.
    pub fn replace(&self, input: &str) -> String {
        if self.pairs.is_empty() {
            return input.to_string();
        }

        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(ch) = rest.chars().next() {
            let hit = self
                .pairs
                .iter()
                .find(|(pattern, _)| rest.starts_with(pattern.as_str()));
            match hit {
                Some((pattern, value)) => {
                    out.push_str(value);
                    rest = &rest[pattern.len()..];
                }
                None => {
                    out.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_empty_parts() {
        let mut store = ValueStore::new();
        assert!(matches!(
            store.add("", "x"),
            Err(ScriptError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.add("x", ""),
            Err(ScriptError::InvalidArgument(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_readd_updates_in_place() {
        let mut store = ValueStore::new();
        store.add("a", "1").unwrap();
        store.add("b", "2").unwrap();
        store.add("a", "3").unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a"), Some("3"));
        assert_eq!(store.pairs[0].0, "##a##");
        assert_eq!(store.pairs[1].0, "##b##");
    }

    #[test]
    fn test_seed_parsing() {
        let store = ValueStore::from_seeds(["env,prod", "schema,public"]).unwrap();
        assert_eq!(store.get("env"), Some("prod"));
        assert_eq!(store.get("schema"), Some("public"));

        assert!(matches!(
            ValueStore::from_seeds(["novalue"]),
            Err(ScriptError::Parse(_))
        ));
        assert!(matches!(
            ValueStore::from_seeds(["a,b,c"]),
            Err(ScriptError::Parse(_))
        ));
        assert!(matches!(
            ValueStore::from_seeds([",b"]),
            Err(ScriptError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_replace_only_wrapped_tokens() {
        let store = ValueStore::from_seeds(["A,1"]).unwrap();
        let r = store.replacer();
        assert_eq!(r.replace("SELECT A, ##A##, #A#"), "SELECT A, 1, #A#");
        assert_eq!(r.replace("##A####A##"), "11");
    }

    #[test]
    fn test_replace_does_not_rescan_inserted_values() {
        let store = ValueStore::from_seeds(["a,##b##", "b,x"]).unwrap();
        assert_eq!(store.replacer().replace("##a## ##b##"), "##b## x");
    }

    #[test]
    fn test_replace_first_declared_pattern_wins() {
        let mut store = ValueStore::new();
        store.add("a", "short").unwrap();
        store.add("a##b", "long").unwrap();
        assert_eq!(store.replacer().replace("##a##b##"), "shortb##");
    }

    #[test]
    fn test_replacer_is_a_snapshot() {
        let mut store = ValueStore::from_seeds(["a,1"]).unwrap();
        let before = store.replacer();
        store.add("a", "2").unwrap();
        assert_eq!(before.replace("##a##"), "1");
        assert_eq!(store.replacer().replace("##a##"), "2");
    }

    #[test]
    fn test_replace_handles_multibyte_text() {
        let store = ValueStore::from_seeds(["name,Zoë"]).unwrap();
        assert_eq!(
            store.replacer().replace("SELECT 'héllo ##name##';"),
            "SELECT 'héllo Zoë';"
        );
    }
}
