use std::fmt;

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Skill(String);

pub type Skills = FxHashSet<Skill>;

impl Skill {
    pub fn new(skill: String) -> Self {
        Skill(skill)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Skill {
    fn from(skill: &str) -> Self {
        Skill(skill.to_owned())
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
