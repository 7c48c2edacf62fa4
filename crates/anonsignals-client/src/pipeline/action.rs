use anonsignals_crypto::Group;
use anonsignals_types::Signal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-facing group action and the (message, scope) it proves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GroupAction {
    Join { group_id: String },
    Post { group_id: String, content: String },
    Vote { group_id: String, post_id: String, choice: String },
}

impl GroupAction {
    pub fn group_id(&self) -> &str {
        match self {
            GroupAction::Join { group_id }
            | GroupAction::Post { group_id, .. }
            | GroupAction::Vote { group_id, .. } => group_id,
        }
    }

    /// Join scopes to `join:<group>`, posts to the group id, votes to the
    /// current group root, so one nullifier per member per root.
    pub fn signals(&self, group: &Group) -> (Signal, Signal) {
        match self {
            GroupAction::Join { group_id } => (
                Signal::text(group_id.as_str()),
                Signal::text(format!("join:{}", group_id)),
            ),
            GroupAction::Post { group_id, content } => {
                (Signal::text(content.as_str()), Signal::text(group_id.as_str()))
            }
            GroupAction::Vote { post_id, choice, .. } => (
                Signal::text(format!("{}:{}", post_id, choice)),
                Signal::Number(group.root()),
            ),
        }
    }
}

impl fmt::Display for GroupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupAction::Join { group_id } => write!(f, "join {}", group_id),
            GroupAction::Post { group_id, .. } => write!(f, "post in {}", group_id),
            GroupAction::Vote { group_id, post_id, .. } => {
                write!(f, "vote on {} in {}", post_id, group_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anonsignals_types::FieldElement;

    fn group() -> Group {
        Group::rebuild(&[FieldElement::from_u64(1), FieldElement::from_u64(2)]).unwrap()
    }

    #[test]
    fn test_join_signals() {
        let action = GroupAction::Join { group_id: "g-1".into() };
        let (message, scope) = action.signals(&group());
        assert_eq!(message, Signal::text("g-1"));
        assert_eq!(scope, Signal::text("join:g-1"));
    }

    #[test]
    fn test_post_scoped_to_group() {
        let action = GroupAction::Post {
            group_id: "g-1".into(),
            content: "hello".into(),
        };
        assert_eq!(action.signals(&group()), (Signal::text("hello"), Signal::text("g-1")));
    }

    #[test]
    fn test_vote_scoped_to_root() {
        let g = group();
        let action = GroupAction::Vote {
            group_id: "g-1".into(),
            post_id: "p-9".into(),
            choice: "yes".into(),
        };
        let (message, scope) = action.signals(&g);
        assert_eq!(message, Signal::text("p-9:yes"));
        assert_eq!(scope, Signal::Number(g.root()));
        assert_eq!(action.group_id(), "g-1");
    }
}
