//! Value objects - Immutable objects defined by their attributes

mod calendar;
mod command;
mod ids;
mod realm;
mod relationship;

pub use calendar::{AdvanceOutcome, GameDate, Season, Shichen, TimeOfDay, Weather};
pub use command::{
    AddCurrencyPayload, AddItemPayload, AddRecipePayload, AddRumorPayload, AddTechniquePayload,
    Command, CreateNpcPayload, DeathPayload, DiscoverLocationPayload, RemoveItemPayload,
    ShopItemPayload, ShowShopPayload, TagName, UpdateAttributePayload, UpdateRelationshipPayload,
};
pub use ids::{LocationId, NpcId, StoryEntryId};
pub use realm::{DestinyPath, Realm, RealmConfig, RealmStage, StageBonuses};
pub use relationship::{
    Relationship, RelationshipStatus, RELATIONSHIP_MAX, RELATIONSHIP_MIN,
};
