use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::TypeError;
use crate::ids::{Address, AdminId, ProjectId};

/// Kind of entity that can hold or control a donation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Giver,
    Dac,
    Campaign,
    Milestone,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Giver => "giver",
            Self::Dac => "dac",
            Self::Campaign => "campaign",
            Self::Milestone => "milestone",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = TypeError;

    /// Case-insensitive, matching the ledger service's loose casing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "giver" => Ok(Self::Giver),
            "dac" => Ok(Self::Dac),
            "campaign" => Ok(Self::Campaign),
            "milestone" => Ok(Self::Milestone),
            _ => Err(TypeError::UnknownEntityKind(s.to_string())),
        }
    }
}

/// Kind of entity that may receive a delegation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Dac,
    Campaign,
    Milestone,
}

impl From<TargetKind> for EntityKind {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Dac => EntityKind::Dac,
            TargetKind::Campaign => EntityKind::Campaign,
            TargetKind::Milestone => EntityKind::Milestone,
        }
    }
}

impl TryFrom<EntityKind> for TargetKind {
    type Error = TypeError;

    fn try_from(kind: EntityKind) -> Result<Self, Self::Error> {
        match kind {
            EntityKind::Dac => Ok(TargetKind::Dac),
            EntityKind::Campaign => Ok(TargetKind::Campaign),
            EntityKind::Milestone => Ok(TargetKind::Milestone),
            EntityKind::Giver => Err(TypeError::NotADelegateTarget(kind.to_string())),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        EntityKind::from(*self).fmt(f)
    }
}

/// Controller account of an entity: the address allowed to act on its
/// pledges, plus the plugin contract for campaigns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAccount {
    pub owner_address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_address: Option<Address>,
}

impl EntityAccount {
    pub fn new(owner_address: Address) -> Self {
        Self {
            owner_address,
            plugin_address: None,
        }
    }

    pub fn with_plugin(mut self, plugin_address: Address) -> Self {
        self.plugin_address = Some(plugin_address);
        self
    }
}

/// One side of a donation: owner, delegate, or intended project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// On-chain admin index.
    pub admin_id: AdminId,
    /// Off-chain identifier (entity record id, or giver address).
    pub type_id: String,
    pub kind: EntityKind,
    /// Populated when the ledger query asks for entity details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<EntityAccount>,
}

impl Party {
    pub fn new(admin_id: AdminId, type_id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            admin_id,
            type_id: type_id.into(),
            kind,
            account: None,
        }
    }

    pub fn with_account(mut self, account: EntityAccount) -> Self {
        self.account = Some(account);
        self
    }

    /// Copy without the enrichment details, for writing back to the ledger.
    pub fn bare(&self) -> Self {
        Self {
            account: None,
            ..self.clone()
        }
    }
}

/// Entity receiving a delegation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateTarget {
    /// On-chain project index (campaign or milestone).
    pub project_id: ProjectId,
    /// On-chain delegate index, set for DACs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate_id: Option<AdminId>,
    /// Off-chain identifier.
    pub id: String,
    pub kind: TargetKind,
    #[serde(default)]
    pub is_capped: bool,
    #[serde(default)]
    pub accepts_single_token: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<Amount>,
    #[serde(default)]
    pub total_donated_single_token: Amount,
}

impl DelegateTarget {
    pub fn campaign(id: impl Into<String>, project_id: ProjectId) -> Self {
        Self::project(id, project_id, TargetKind::Campaign)
    }

    pub fn milestone(id: impl Into<String>, project_id: ProjectId) -> Self {
        Self::project(id, project_id, TargetKind::Milestone)
    }

    pub fn dac(id: impl Into<String>, delegate_id: AdminId) -> Self {
        Self {
            delegate_id: Some(delegate_id),
            ..Self::project(id, 0, TargetKind::Dac)
        }
    }

    fn project(id: impl Into<String>, project_id: ProjectId, kind: TargetKind) -> Self {
        Self {
            project_id,
            delegate_id: None,
            id: id.into(),
            kind,
            is_capped: false,
            accepts_single_token: false,
            max_amount: None,
            total_donated_single_token: Amount::zero(),
        }
    }

    /// Cap the target at `max_amount` (capped milestones).
    pub fn with_cap(mut self, max_amount: Amount, already_donated: Amount) -> Self {
        self.is_capped = true;
        self.accepts_single_token = true;
        self.max_amount = Some(max_amount);
        self.total_donated_single_token = already_donated;
        self
    }

    /// Admin index used as the receiver of a single transfer.
    pub fn receiver_id(&self) -> AdminId {
        match self.kind {
            TargetKind::Dac => self.delegate_id.unwrap_or(self.project_id),
            TargetKind::Campaign | TargetKind::Milestone => self.project_id,
        }
    }

    /// The target as a ledger party, indexed by its receiving admin id.
    pub fn as_party(&self) -> Party {
        Party::new(self.receiver_id(), self.id.clone(), self.kind.into())
    }

    /// Amount the target can still take, if it is capped.
    pub fn remaining_capacity(&self) -> Option<Amount> {
        if !self.is_capped {
            return None;
        }
        self.max_amount
            .as_ref()
            .map(|max| max.saturating_sub(&self.total_donated_single_token))
    }
}
