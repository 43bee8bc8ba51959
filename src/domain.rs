use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::RosterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Member,
    Visitor,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Member => write!(f, "member"),
            Category::Visitor => write!(f, "visitor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MembershipLevel {
    Leader,
    Worker,
    Disciple,
}

impl fmt::Display for MembershipLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipLevel::Leader => write!(f, "leader"),
            MembershipLevel::Worker => write!(f, "worker"),
            MembershipLevel::Disciple => write!(f, "disciple"),
        }
    }
}

impl FromStr for MembershipLevel {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "leader" => Ok(MembershipLevel::Leader),
            "worker" => Ok(MembershipLevel::Worker),
            "disciple" => Ok(MembershipLevel::Disciple),
            _ => Err(RosterError::InvalidLevel(value.to_string())),
        }
    }
}

/// Lifecycle tag. Members move through active/inactive/archived; first-time
/// visitors through new/contacted/converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Inactive,
    Archived,
    New,
    Contacted,
    Converted,
}

impl RecordStatus {
    pub fn default_for(category: Category) -> Self {
        match category {
            Category::Member => RecordStatus::Active,
            Category::Visitor => RecordStatus::New,
        }
    }

    pub fn valid_for(self, category: Category) -> bool {
        match category {
            Category::Member => matches!(
                self,
                RecordStatus::Active | RecordStatus::Inactive | RecordStatus::Archived
            ),
            Category::Visitor => matches!(
                self,
                RecordStatus::New
                    | RecordStatus::Contacted
                    | RecordStatus::Converted
                    | RecordStatus::Archived
            ),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            RecordStatus::Active => "active",
            RecordStatus::Inactive => "inactive",
            RecordStatus::Archived => "archived",
            RecordStatus::New => "new",
            RecordStatus::Contacted => "contacted",
            RecordStatus::Converted => "converted",
        };
        write!(f, "{tag}")
    }
}

impl FromStr for RecordStatus {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "active" => Ok(RecordStatus::Active),
            "inactive" => Ok(RecordStatus::Inactive),
            "archived" => Ok(RecordStatus::Archived),
            "new" => Ok(RecordStatus::New),
            "contacted" => Ok(RecordStatus::Contacted),
            "converted" => Ok(RecordStatus::Converted),
            _ => Err(RosterError::InvalidStatus(value.to_string())),
        }
    }
}

/// Mutually exclusive partition of the directory. Each tab is a predicate
/// over category plus the member sub-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Workers,
    Converts,
    Visitors,
}

impl Tab {
    pub fn category(self) -> Category {
        match self {
            Tab::Workers | Tab::Converts => Category::Member,
            Tab::Visitors => Category::Visitor,
        }
    }

    pub fn matches(self, record: &Record) -> bool {
        match self {
            Tab::Workers => {
                record.category == Category::Member
                    && matches!(
                        record.level,
                        Some(MembershipLevel::Leader) | Some(MembershipLevel::Worker)
                    )
            }
            Tab::Converts => {
                record.category == Category::Member
                    && record.level == Some(MembershipLevel::Disciple)
            }
            Tab::Visitors => record.category == Category::Visitor,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tab::Workers => write!(f, "workers"),
            Tab::Converts => write!(f, "converts"),
            Tab::Visitors => write!(f, "visitors"),
        }
    }
}

impl FromStr for Tab {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "workers" => Ok(Tab::Workers),
            "converts" => Ok(Tab::Converts),
            "visitors" => Ok(Tab::Visitors),
            _ => Err(RosterError::InvalidTab(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Email,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Sms => write!(f, "sms"),
            Channel::Email => write!(f, "email"),
        }
    }
}

impl FromStr for Channel {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sms" => Ok(Channel::Sms),
            "email" => Ok(Channel::Email),
            _ => Err(RosterError::InvalidChannel(value.to_string())),
        }
    }
}

/// Opaque stable identifier, unique within its category. Assigned by the
/// directory store and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid =
            !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_graphic());
        if !is_valid {
            return Err(RosterError::InvalidRecordId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchId(String);

impl BranchId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BranchId {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid =
            !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_graphic());
        if !is_valid {
            return Err(RosterError::InvalidBranchId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Branch scope for queries and filtering; `all` is the wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BranchFilter {
    #[default]
    All,
    Branch(BranchId),
}

impl fmt::Display for BranchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchFilter::All => write!(f, "all"),
            BranchFilter::Branch(branch) => write!(f, "{branch}"),
        }
    }
}

impl FromStr for BranchFilter {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(BranchFilter::All);
        }
        Ok(BranchFilter::Branch(value.parse()?))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelFilter {
    #[default]
    All,
    Only(MembershipLevel),
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelFilter::All => write!(f, "all"),
            LevelFilter::Only(level) => write!(f, "{level}"),
        }
    }
}

impl FromStr for LevelFilter {
    type Err = RosterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(LevelFilter::All);
        }
        Ok(LevelFilter::Only(value.parse()?))
    }
}

/// A member or first-time visitor as held by the directory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub category: Category,
    pub branch_id: BranchId,
    pub display_name: String,
    pub status: RecordStatus,
    #[serde(default)]
    pub level: Option<MembershipLevel>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub joined_on: NaiveDate,
}

/// Record shape before the store has assigned an id; what the normalizer
/// produces and `write_batch` consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub category: Category,
    pub branch_id: BranchId,
    pub display_name: String,
    pub status: RecordStatus,
    #[serde(default)]
    pub level: Option<MembershipLevel>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub joined_on: NaiveDate,
}

impl RecordDraft {
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            category: self.category,
            branch_id: self.branch_id,
            display_name: self.display_name,
            status: self.status,
            level: self.level,
            email: self.email,
            phone: self.phone,
            joined_on: self.joined_on,
        }
    }
}

/// Immutable per evaluation; any field change starts a new filter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub tab: Tab,
    pub search_term: String,
    pub level: LevelFilter,
    pub branch: BranchFilter,
}

impl FilterCriteria {
    /// All-wildcard criteria for a tab: identity restricted to the tab predicate.
    pub fn new(tab: Tab) -> Self {
        Self {
            tab,
            search_term: String::new(),
            level: LevelFilter::All,
            branch: BranchFilter::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn record(category: Category, level: Option<MembershipLevel>) -> Record {
        Record {
            id: "M-0001".parse().unwrap(),
            category,
            branch_id: "central".parse().unwrap(),
            display_name: "Ann Example".to_string(),
            status: RecordStatus::default_for(category),
            level,
            email: None,
            phone: None,
            joined_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn parse_record_id_valid() {
        let id: RecordId = "  M-0042 ".parse().unwrap();
        assert_eq!(id.as_str(), "M-0042");
    }

    #[test]
    fn parse_record_id_invalid() {
        let err = "".parse::<RecordId>().unwrap_err();
        assert_matches!(err, RosterError::InvalidRecordId(_));
        let err = "has space".parse::<RecordId>().unwrap_err();
        assert_matches!(err, RosterError::InvalidRecordId(_));
    }

    #[test]
    fn parse_branch_filter() {
        assert_eq!("ALL".parse::<BranchFilter>().unwrap(), BranchFilter::All);
        let filter: BranchFilter = "north".parse().unwrap();
        assert_matches!(filter, BranchFilter::Branch(_));
    }

    #[test]
    fn parse_level_filter() {
        assert_eq!("all".parse::<LevelFilter>().unwrap(), LevelFilter::All);
        assert_eq!(
            "Worker".parse::<LevelFilter>().unwrap(),
            LevelFilter::Only(MembershipLevel::Worker)
        );
        let err = "elder".parse::<LevelFilter>().unwrap_err();
        assert_matches!(err, RosterError::InvalidLevel(_));
    }

    #[test]
    fn tab_partition_is_disjoint() {
        let leader = record(Category::Member, Some(MembershipLevel::Leader));
        let worker = record(Category::Member, Some(MembershipLevel::Worker));
        let disciple = record(Category::Member, Some(MembershipLevel::Disciple));
        let visitor = record(Category::Visitor, None);

        assert!(Tab::Workers.matches(&leader));
        assert!(Tab::Workers.matches(&worker));
        assert!(!Tab::Workers.matches(&disciple));
        assert!(!Tab::Workers.matches(&visitor));

        assert!(Tab::Converts.matches(&disciple));
        assert!(!Tab::Converts.matches(&worker));

        assert!(Tab::Visitors.matches(&visitor));
        assert!(!Tab::Visitors.matches(&leader));
    }

    #[test]
    fn tab_category_routing() {
        assert_eq!(Tab::Workers.category(), Category::Member);
        assert_eq!(Tab::Converts.category(), Category::Member);
        assert_eq!(Tab::Visitors.category(), Category::Visitor);
    }

    #[test]
    fn status_defaults_per_category() {
        assert_eq!(
            RecordStatus::default_for(Category::Member),
            RecordStatus::Active
        );
        assert_eq!(
            RecordStatus::default_for(Category::Visitor),
            RecordStatus::New
        );
        assert!(RecordStatus::Contacted.valid_for(Category::Visitor));
        assert!(!RecordStatus::Contacted.valid_for(Category::Member));
    }
}
