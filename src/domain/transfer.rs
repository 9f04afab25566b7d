use serde::{Deserialize, Serialize};

use super::{AccountNumber, Cents, OwnerId, OwnerKind};

/// One side of a transfer: an account addressed by owner and account number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub kind: OwnerKind,
    pub owner_id: OwnerId,
    pub account_number: AccountNumber,
}

impl AccountRef {
    pub fn client(owner_id: OwnerId, account_number: AccountNumber) -> Self {
        Self {
            kind: OwnerKind::Client,
            owner_id,
            account_number,
        }
    }

    pub fn service(owner_id: OwnerId, account_number: AccountNumber) -> Self {
        Self {
            kind: OwnerKind::Service,
            owner_id,
            account_number,
        }
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.kind, self.owner_id, self.account_number)
    }
}

/// A request to move `amount` from a client account to a client or service
/// account. Consumed by a single transfer call; nothing about it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub amount: Cents,
    pub sender_owner_id: OwnerId,
    pub sender_account_number: AccountNumber,
    pub receiver_owner_id: OwnerId,
    pub receiver_account_number: AccountNumber,
    pub receiver_kind: OwnerKind,
}

impl TransferRequest {
    /// Client-to-client transfer.
    pub fn to_client(
        amount: Cents,
        sender: (OwnerId, AccountNumber),
        receiver: (OwnerId, AccountNumber),
    ) -> Self {
        Self {
            amount,
            sender_owner_id: sender.0,
            sender_account_number: sender.1,
            receiver_owner_id: receiver.0,
            receiver_account_number: receiver.1,
            receiver_kind: OwnerKind::Client,
        }
    }

    /// Client-to-service transfer (bill payment).
    pub fn to_service(
        amount: Cents,
        sender: (OwnerId, AccountNumber),
        receiver: (OwnerId, AccountNumber),
    ) -> Self {
        Self {
            receiver_kind: OwnerKind::Service,
            ..Self::to_client(amount, sender, receiver)
        }
    }

    /// Senders are always client accounts.
    pub fn sender(&self) -> AccountRef {
        AccountRef::client(self.sender_owner_id, self.sender_account_number)
    }

    pub fn receiver(&self) -> AccountRef {
        AccountRef {
            kind: self.receiver_kind,
            owner_id: self.receiver_owner_id,
            account_number: self.receiver_account_number,
        }
    }

    pub fn is_self_transfer(&self) -> bool {
        self.sender() == self.receiver()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_is_always_a_client_account() {
        let request = TransferRequest::to_service(500, (1, 0), (9, 2));
        assert_eq!(request.sender(), AccountRef::client(1, 0));
        assert_eq!(request.receiver(), AccountRef::service(9, 2));
        assert!(!request.is_self_transfer());
    }

    #[test]
    fn test_self_transfer_detection() {
        assert!(TransferRequest::to_client(1, (3, 1), (3, 1)).is_self_transfer());
        // Same ids, different tables.
        assert!(!TransferRequest::to_service(1, (3, 1), (3, 1)).is_self_transfer());
    }
}
