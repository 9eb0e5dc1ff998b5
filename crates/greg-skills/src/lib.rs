//! # greg-skills
//!
//! A skill is a Markdown file in the skills directory. Its optional
//! frontmatter carries a `description`; the rest is instructions for the
//! model. Skills without a description are always active. The others are
//! activated per request by the [`matcher`].

pub mod definition;
pub mod matcher;
pub mod store;

pub use definition::Skill;
pub use matcher::{keyword_match, select_skills, SkillSelector};
pub use store::SkillStore;
