//! Slot state used to narrow a query down to one service.

use std::fmt;

use onward_types::knowledge::KnowledgeRecord;

/// A record attribute that tells close services apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    ServiceName,
    Department,
    UserType,
    Tags,
}

impl Slot {
    /// Order in which slots are asked about.
    pub const PRIORITY: [Slot; 4] = [
        Slot::ServiceName,
        Slot::Department,
        Slot::UserType,
        Slot::Tags,
    ];

    /// The record field this slot reads, trimmed.
    pub fn value_of(self, record: &KnowledgeRecord) -> &str {
        match self {
            Slot::ServiceName => record.service_name.trim(),
            Slot::Department => record.department.trim(),
            Slot::UserType => record.user_type.trim(),
            Slot::Tags => record.tags.trim(),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::ServiceName => write!(f, "service_name"),
            Slot::Department => write!(f, "department"),
            Slot::UserType => write!(f, "user_type"),
            Slot::Tags => write!(f, "tags"),
        }
    }
}

/// What the conversation has pinned down so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceSlots {
    pub service_name: Option<String>,
    pub department: Option<String>,
    pub user_type: Option<String>,
    pub tags: Option<String>,
}

impl ServiceSlots {
    pub fn get(&self, slot: Slot) -> Option<&str> {
        let value = match slot {
            Slot::ServiceName => &self.service_name,
            Slot::Department => &self.department,
            Slot::UserType => &self.user_type,
            Slot::Tags => &self.tags,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_missing(&self, slot: Slot) -> bool {
        self.get(slot).is_none()
    }

    /// Fill every slot the record has a value for. Empty fields leave slots untouched.
    pub fn update_from(&mut self, record: &KnowledgeRecord) {
        for slot in Slot::PRIORITY {
            let value = slot.value_of(record);
            if value.is_empty() {
                continue;
            }
            let target = match slot {
                Slot::ServiceName => &mut self.service_name,
                Slot::Department => &mut self.department,
                Slot::UserType => &mut self.user_type,
                Slot::Tags => &mut self.tags,
            };
            *target = Some(value.to_string());
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for ServiceSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled: Vec<String> = Slot::PRIORITY
            .iter()
            .filter_map(|s| self.get(*s).map(|v| format!("{s}={v}")))
            .collect();
        let missing: Vec<String> = Slot::PRIORITY
            .iter()
            .filter(|s| self.is_missing(**s))
            .map(|s| s.to_string())
            .collect();
        write!(
            f,
            "filled [{}], missing [{}]",
            filled.join(", "),
            missing.join(", ")
        )
    }
}
