//! Command tags - the closed grammar of state mutations embedded in
//! generated narrative text
//!
//! Narrative text may contain zero or more non-overlapping tags of the form
//! `[NAME:{json}]`. `NAME` must be one of the closed [`TagName`] enum or the
//! bracket sequence is not recognized at all and stays plain text. Each
//! payload is decoded independently into the matching [`Command`] variant;
//! commands are parse artifacts, never stored entities.

use serde::Deserialize;

/// The closed set of recognized tag names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagName {
    AddItem,
    RemoveItem,
    AddCurrency,
    CreateNpc,
    DiscoverLocation,
    AddRumor,
    ShowShop,
    UpdateRelationship,
    Death,
    AddTechnique,
    UpdateAttribute,
    AddRecipe,
}

impl TagName {
    pub const ALL: [TagName; 12] = [
        TagName::AddItem,
        TagName::RemoveItem,
        TagName::AddCurrency,
        TagName::CreateNpc,
        TagName::DiscoverLocation,
        TagName::AddRumor,
        TagName::ShowShop,
        TagName::UpdateRelationship,
        TagName::Death,
        TagName::AddTechnique,
        TagName::UpdateAttribute,
        TagName::AddRecipe,
    ];

    /// The wire spelling inside a tag
    pub fn as_str(&self) -> &'static str {
        match self {
            TagName::AddItem => "ADD_ITEM",
            TagName::RemoveItem => "REMOVE_ITEM",
            TagName::AddCurrency => "ADD_CURRENCY",
            TagName::CreateNpc => "CREATE_NPC",
            TagName::DiscoverLocation => "DISCOVER_LOCATION",
            TagName::AddRumor => "ADD_RUMOR",
            TagName::ShowShop => "SHOW_SHOP",
            TagName::UpdateRelationship => "UPDATE_RELATIONSHIP",
            TagName::Death => "DEATH",
            TagName::AddTechnique => "ADD_TECHNIQUE",
            TagName::UpdateAttribute => "UPDATE_ATTRIBUTE",
            TagName::AddRecipe => "ADD_RECIPE",
        }
    }

    pub fn parse(name: &str) -> Option<TagName> {
        Self::ALL.iter().copied().find(|tag| tag.as_str() == name)
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddItemPayload {
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoveItemPayload {
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddCurrencyPayload {
    pub name: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateNpcPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Where the NPC appears; defaults to the player's current location
    #[serde(default)]
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiscoverLocationPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddRumorPayload {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopItemPayload {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShowShopPayload {
    #[serde(default)]
    pub shop_name: Option<String>,
    pub items: Vec<ShopItemPayload>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateRelationshipPayload {
    pub npc_name: String,
    pub delta: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeathPayload {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddTechniquePayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateAttributePayload {
    pub name: String,
    pub delta: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddRecipePayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A fully decoded command tag
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddItem(AddItemPayload),
    RemoveItem(RemoveItemPayload),
    AddCurrency(AddCurrencyPayload),
    CreateNpc(CreateNpcPayload),
    DiscoverLocation(DiscoverLocationPayload),
    AddRumor(AddRumorPayload),
    ShowShop(ShowShopPayload),
    UpdateRelationship(UpdateRelationshipPayload),
    Death(DeathPayload),
    AddTechnique(AddTechniquePayload),
    UpdateAttribute(UpdateAttributePayload),
    AddRecipe(AddRecipePayload),
}

impl Command {
    /// Decode the JSON payload of a recognized tag into the matching
    /// command variant. Schema violations surface as the `serde_json` error
    /// so the interpreter can quarantine the single tag.
    pub fn decode(name: TagName, payload: &str) -> Result<Command, serde_json::Error> {
        Ok(match name {
            TagName::AddItem => Command::AddItem(serde_json::from_str(payload)?),
            TagName::RemoveItem => Command::RemoveItem(serde_json::from_str(payload)?),
            TagName::AddCurrency => Command::AddCurrency(serde_json::from_str(payload)?),
            TagName::CreateNpc => Command::CreateNpc(serde_json::from_str(payload)?),
            TagName::DiscoverLocation => Command::DiscoverLocation(serde_json::from_str(payload)?),
            TagName::AddRumor => Command::AddRumor(serde_json::from_str(payload)?),
            TagName::ShowShop => Command::ShowShop(serde_json::from_str(payload)?),
            TagName::UpdateRelationship => {
                Command::UpdateRelationship(serde_json::from_str(payload)?)
            }
            TagName::Death => Command::Death(serde_json::from_str(payload)?),
            TagName::AddTechnique => Command::AddTechnique(serde_json::from_str(payload)?),
            TagName::UpdateAttribute => Command::UpdateAttribute(serde_json::from_str(payload)?),
            TagName::AddRecipe => Command::AddRecipe(serde_json::from_str(payload)?),
        })
    }
}
