use regex::{Regex, RegexBuilder};

use crate::domain::user::{Role, User};

/// Case-insensitive substring match against any of a set of skill tags.
///
/// Tags are escaped before being combined, so a tag such as `C++` matches
/// literally instead of being read as a pattern.
#[derive(Debug, Clone)]
pub struct SkillPattern {
    regex: Regex,
}

impl SkillPattern {
    /// Returns `None` when no usable tag remains after trimming, or when the
    /// combined pattern exceeds the regex size limit.
    pub fn new(skills: &[String]) -> Option<Self> {
        let terms = skills
            .iter()
            .map(|skill| skill.trim())
            .filter(|skill| !skill.is_empty())
            .map(regex::escape)
            .collect::<Vec<_>>();

        if terms.is_empty() {
            return None;
        }

        match RegexBuilder::new(&terms.join("|"))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => Some(Self { regex }),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    terms = terms.len(),
                    "skill pattern rejected; skipping skill match"
                );
                None
            }
        }
    }

    pub fn matches(&self, skill: &str) -> bool {
        self.regex.is_match(skill)
    }

    pub fn matches_any(&self, skills: &[String]) -> bool {
        skills.iter().any(|skill| self.matches(skill))
    }
}

/// Filter understood by user stores: role equality plus an optional skill match.
#[derive(Debug, Clone)]
pub struct UserQuery {
    pub role: Role,
    pub skills: Option<SkillPattern>,
}

impl UserQuery {
    pub fn role(role: Role) -> Self {
        Self { role, skills: None }
    }

    pub fn with_skills(mut self, pattern: SkillPattern) -> Self {
        self.skills = Some(pattern);
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        if user.role != self.role {
            return false;
        }
        match &self.skills {
            Some(pattern) => pattern.matches_any(&user.skills),
            None => true,
        }
    }
}

/// Lookups tried in order when choosing an assignee: a moderator with a
/// matching skill, then any moderator, then any admin.
pub fn assignment_queries(skills: &[String]) -> Vec<UserQuery> {
    let mut queries = Vec::with_capacity(3);
    if let Some(pattern) = SkillPattern::new(skills) {
        queries.push(UserQuery::role(Role::Moderator).with_skills(pattern));
    }
    queries.push(UserQuery::role(Role::Moderator));
    queries.push(UserQuery::role(Role::Admin));
    queries
}
