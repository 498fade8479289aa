use crate::enums::{BuyNeed, Direction};
use crate::model::{EntityId, ItemId};
use serde::{Deserialize, Serialize};

/// The engine's entire output: exactly one of these per tick. Serialized as
/// a tagged object (`{"type": "move", "direction": "n"}`) for the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BotAction {
    Move { direction: Direction },
    Attack { target_id: EntityId },
    RangedAttack { target_id: EntityId },
    Descend,
    Ascend,
    Wait,
    Pickup { item_id: ItemId },
    Use { item_id: ItemId },
    Cast {
        spell_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_id: Option<EntityId>,
    },
    UseHealer,
    UseAltar,
    UseReturnPortal,
    SellToMerchant { item_id: ItemId },
    /// The world resolves the concrete purchase; the engine only names the
    /// need (shop stock is not part of the snapshot).
    BuyFromMerchant { need: BuyNeed },
}

impl BotAction {
    /// Whether this action consumes the turn without changing anything.
    pub fn is_wait(&self) -> bool {
        matches!(self, BotAction::Wait)
    }
}

impl std::fmt::Display for BotAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotAction::Move { direction } => write!(f, "move {:?}", direction),
            BotAction::Attack { target_id } => write!(f, "attack #{}", target_id),
            BotAction::RangedAttack { target_id } => write!(f, "ranged attack #{}", target_id),
            BotAction::Descend => write!(f, "descend"),
            BotAction::Ascend => write!(f, "ascend"),
            BotAction::Wait => write!(f, "wait"),
            BotAction::Pickup { item_id } => write!(f, "pickup #{}", item_id),
            BotAction::Use { item_id } => write!(f, "use #{}", item_id),
            BotAction::Cast { spell_id, target_id } => match target_id {
                Some(t) => write!(f, "cast {} at #{}", spell_id, t),
                None => write!(f, "cast {}", spell_id),
            },
            BotAction::UseHealer => write!(f, "use healer"),
            BotAction::UseAltar => write!(f, "use altar"),
            BotAction::UseReturnPortal => write!(f, "use return portal"),
            BotAction::SellToMerchant { item_id } => write!(f, "sell #{}", item_id),
            BotAction::BuyFromMerchant { need } => write!(f, "buy {:?}", need),
        }
    }
}
