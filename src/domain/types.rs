//! Shared domain enumerations aligned with persisted database enums.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "ad_status", rename_all = "snake_case")]
pub enum AdStatus {
    Pending,
    Approved,
    Rejected,
}

impl AdStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl Display for AdStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "ad_category", rename_all = "snake_case")]
pub enum Category {
    Home,
    Cars,
    Realestate,
    Services,
    Jobs,
    Donations,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Cars => "cars",
            Self::Realestate => "realestate",
            Self::Services => "services",
            Self::Jobs => "jobs",
            Self::Donations => "donations",
        }
    }

    /// All categories, in the order used for count listings.
    pub fn all() -> &'static [Category] {
        &[
            Self::Home,
            Self::Cars,
            Self::Realestate,
            Self::Services,
            Self::Jobs,
            Self::Donations,
        ]
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Self::Home),
            "cars" => Ok(Self::Cars),
            "realestate" => Ok(Self::Realestate),
            "services" => Ok(Self::Services),
            "jobs" => Ok(Self::Jobs),
            "donations" => Ok(Self::Donations),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "job_type", rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Remote,
    Freelance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "job_experience", rename_all = "snake_case")]
pub enum JobExperience {
    Entry,
    Mid,
    Senior,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "premium_plan", rename_all = "snake_case")]
pub enum PremiumPlan {
    None,
    Gold,
    Platinum,
}
