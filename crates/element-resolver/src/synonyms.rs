//! Semantic equivalence tables for survey answer values.
//!
//! Survey pages rarely spell an answer the way a persona profile does:
//! the profile says "Male", the radio says "Man"; the profile says
//! "45-54", the dropdown says "45 to 54". The table groups spellings
//! that mean the same answer so the semantic strategy can bridge them.

/// Groups of answer spellings that are interchangeable.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    groups: Vec<Vec<String>>,
}

impl SynonymTable {
    /// Table covering the demographic vocabularies seen across panels:
    /// gender, employment status and education level. Numeric age
    /// ranges are handled structurally, not by enumeration.
    pub fn builtin() -> Self {
        let groups = [
            &["male", "man", "m", "gentleman"][..],
            &["female", "woman", "f", "lady"][..],
            &["non-binary", "nonbinary", "gender diverse", "other"][..],
            &["prefer not to say", "prefer not to answer", "rather not say"][..],
            &[
                "employed full-time",
                "full-time",
                "full time",
                "working full-time",
                "employed full time",
            ][..],
            &[
                "employed part-time",
                "part-time",
                "part time",
                "working part-time",
            ][..],
            &["self-employed", "self employed", "business owner"][..],
            &["unemployed", "not employed", "not working", "looking for work"][..],
            &["retired", "retiree"][..],
            &["student", "studying", "in education"][..],
            &["homemaker", "home duties", "stay at home parent"][..],
            &["high school", "secondary school", "year 12", "hsc"][..],
            &[
                "bachelor degree",
                "bachelor's degree",
                "bachelors degree",
                "undergraduate degree",
                "university degree",
            ][..],
            &[
                "master degree",
                "master's degree",
                "masters degree",
                "postgraduate degree",
            ][..],
            &["doctorate", "phd", "doctoral degree"][..],
            &["diploma", "certificate", "tafe", "trade qualification"][..],
        ];
        Self {
            groups: groups
                .iter()
                .map(|g| g.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    pub fn with_group<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .push(members.into_iter().map(|m| m.into().to_lowercase()).collect());
        self
    }

    /// Whether two spellings name the same answer.
    pub fn same_group(&self, a: &str, b: &str) -> bool {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if a == b {
            return true;
        }
        if let (Some(ra), Some(rb)) = (parse_range(&a), parse_range(&b)) {
            return ra == rb;
        }
        self.groups
            .iter()
            .any(|g| g.iter().any(|m| *m == a) && g.iter().any(|m| *m == b))
    }

    /// Alternative spellings for a target value, target excluded.
    pub fn alternatives_for(&self, target: &str) -> Vec<String> {
        let needle = target.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut out: Vec<String> = Vec::new();
        for group in &self.groups {
            if group.iter().any(|m| *m == needle) {
                out.extend(group.iter().filter(|m| **m != needle).cloned());
            }
        }
        if let Some((lo, hi)) = parse_range(&needle) {
            for variant in [
                format!("{} to {}", lo, hi),
                format!("{}-{}", lo, hi),
                format!("{} - {}", lo, hi),
            ] {
                if variant != needle && !out.contains(&variant) {
                    out.push(variant);
                }
            }
        }
        out
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Two numbers in a string make it a range; the separator between them
/// ("-", "to", an en dash) does not matter.
fn parse_range(s: &str) -> Option<(u32, u32)> {
    let mut numbers: Vec<u32> = Vec::new();
    let mut current = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else if !current.is_empty() {
            numbers.push(current.parse().ok()?);
            current.clear();
        }
    }
    if !current.is_empty() {
        numbers.push(current.parse().ok()?);
    }
    match numbers.as_slice() {
        [lo, hi] => Some((*lo, *hi)),
        _ => None,
    }
}
