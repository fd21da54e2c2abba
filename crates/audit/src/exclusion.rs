//! Resource exclusion filters.
//!
//! Applied inside individual checks to the remote resources they scan.
//! Independent of the skip/only filters that decide which checks run.

use regex::Regex;

/// Name-based filter over remote resources.
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    exclude: Vec<String>,
    exclude_except: Vec<String>,
    exclude_regex: Vec<Regex>,
}

impl ResourceFilter {
    /// Builds a filter.
    ///
    /// Blank entries in `exclude_except` are ignored, so a list containing
    /// only blanks does not exclude everything.
    ///
    /// # Errors
    ///
    /// Returns the first pattern in `exclude_regex` that does not compile.
    pub fn new(
        exclude: &[String],
        exclude_except: &[String],
        exclude_regex: &[String],
    ) -> Result<Self, regex::Error> {
        let exclude_regex = exclude_regex
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude: trimmed(exclude),
            exclude_except: trimmed(exclude_except),
            exclude_regex,
        })
    }

    /// Names explicitly included; when non-empty every other name is excluded.
    pub fn included_names(&self) -> &[String] {
        &self.exclude_except
    }

    /// Returns `true` if the resource called `name` must not be scanned.
    pub fn is_excluded(&self, name: &str) -> bool {
        if name.trim().is_empty() {
            return true;
        }

        if self.exclude.iter().any(|e| e == name) {
            return true;
        }

        if self.exclude_regex.iter().any(|r| r.is_match(name)) {
            return true;
        }

        !self.exclude_except.is_empty() && !self.exclude_except.iter().any(|e| e == name)
    }
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
