use std::fmt;

use giveth_types::{Address, AdminId, Amount, PledgeId, ProjectId};
use serde::Serialize;

/// Contract a call is addressed to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "address")]
pub enum Contract {
    /// The network's liquid-pledging contract.
    LiquidPledging,
    /// A campaign's plugin contract, which moves pledges the campaign owns.
    CampaignPlugin(Address),
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LiquidPledging => f.write_str("liquidPledging"),
            Self::CampaignPlugin(address) => write!(f, "campaignPlugin({address})"),
        }
    }
}

/// Move `amount` out of one pledge.
///
/// Plugin calls act on behalf of the campaign and carry no sender id;
/// liquid-pledging calls name the admin the value is sent from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCall {
    pub contract: Contract,
    pub from: Address,
    pub sender_id: Option<AdminId>,
    pub pledge_id: PledgeId,
    pub amount: Amount,
    pub receiver_id: AdminId,
}

impl TransferCall {
    pub fn liquid_pledging(
        from: Address,
        sender_id: AdminId,
        pledge_id: PledgeId,
        amount: Amount,
        receiver_id: AdminId,
    ) -> Self {
        Self {
            contract: Contract::LiquidPledging,
            from,
            sender_id: Some(sender_id),
            pledge_id,
            amount,
            receiver_id,
        }
    }

    pub fn campaign_plugin(
        plugin: Address,
        from: Address,
        pledge_id: PledgeId,
        amount: Amount,
        receiver_id: AdminId,
    ) -> Self {
        Self {
            contract: Contract::CampaignPlugin(plugin),
            from,
            sender_id: None,
            pledge_id,
            amount,
            receiver_id,
        }
    }
}

impl fmt::Display for TransferCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sender_id {
            Some(sender) => write!(
                f,
                "{}.transfer({sender}, {}, {}, {})",
                self.contract, self.pledge_id, self.amount, self.receiver_id
            ),
            None => write!(
                f,
                "{}.transfer({}, {}, {})",
                self.contract, self.pledge_id, self.amount, self.receiver_id
            ),
        }
    }
}

/// Move several pledges to one receiver in a single transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiTransferCall {
    pub contract: Contract,
    pub from: Address,
    pub sender_id: Option<AdminId>,
    /// Packed `(amount, pledgeId)` words.
    pub notes: Vec<String>,
    pub receiver_id: ProjectId,
    /// Gas added on top of the node's estimate.
    pub extra_gas: u64,
}

impl fmt::Display for MultiTransferCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.mTransfer(", self.contract)?;
        if let Some(sender) = self.sender_id {
            write!(f, "{sender}, ")?;
        }
        write!(f, "[{} notes], {})", self.notes.len(), self.receiver_id)
    }
}

/// Withdraw value out of a pledge back to its owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawCall {
    pub from: Address,
    pub pledge_id: PledgeId,
    pub amount: Amount,
}

impl fmt::Display for WithdrawCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.withdraw({}, {})",
            Contract::LiquidPledging,
            self.pledge_id,
            self.amount
        )
    }
}

/// A call as it reached the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "method")]
pub enum SubmittedCall {
    Transfer(TransferCall),
    MultiTransfer(MultiTransferCall),
    Withdraw(WithdrawCall),
}

impl SubmittedCall {
    pub fn from_address(&self) -> &Address {
        match self {
            Self::Transfer(call) => &call.from,
            Self::MultiTransfer(call) => &call.from,
            Self::Withdraw(call) => &call.from,
        }
    }
}

impl From<TransferCall> for SubmittedCall {
    fn from(call: TransferCall) -> Self {
        Self::Transfer(call)
    }
}

impl From<MultiTransferCall> for SubmittedCall {
    fn from(call: MultiTransferCall) -> Self {
        Self::MultiTransfer(call)
    }
}

impl From<WithdrawCall> for SubmittedCall {
    fn from(call: WithdrawCall) -> Self {
        Self::Withdraw(call)
    }
}

impl fmt::Display for SubmittedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer(call) => call.fmt(f),
            Self::MultiTransfer(call) => call.fmt(f),
            Self::Withdraw(call) => call.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: char) -> Address {
        format!("0x{}", byte.to_string().repeat(40)).parse().unwrap()
    }

    #[test]
    fn transfer_display_includes_sender_only_for_liquid_pledging() {
        let lp = TransferCall::liquid_pledging(addr('a'), 3, PledgeId(7), Amount::from(10u64), 9);
        assert_eq!(lp.to_string(), "liquidPledging.transfer(3, 7, 10, 9)");

        let plugin = TransferCall::campaign_plugin(addr('b'), addr('a'), PledgeId(7), Amount::from(10u64), 9);
        assert_eq!(
            plugin.to_string(),
            format!("campaignPlugin({}).transfer(7, 10, 9)", addr('b'))
        );
    }

    #[test]
    fn multi_transfer_display() {
        let call = MultiTransferCall {
            contract: Contract::LiquidPledging,
            from: addr('c'),
            sender_id: Some(4),
            notes: vec!["0x01".into(), "0x02".into()],
            receiver_id: 12,
            extra_gas: 100_000,
        };
        assert_eq!(call.to_string(), "liquidPledging.mTransfer(4, [2 notes], 12)");
    }

    #[test]
    fn submitted_call_serializes_with_method_tag() {
        let call = SubmittedCall::Withdraw(WithdrawCall {
            from: addr('d'),
            pledge_id: PledgeId(2),
            amount: Amount::from(5u64),
        });
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["method"], "withdraw");
        assert_eq!(json["amount"], "5");
        assert_eq!(call.from_address(), &addr('d'));
    }
}
