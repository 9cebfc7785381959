//! Player character - attributes, inventory, currencies, cultivation state
//! and everything else the command interpreter mutates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Relationship, StageBonuses};

/// Attribute name that counts years lived
pub const ATTR_AGE: &str = "Tuổi";
/// Attribute name that caps how many years may be lived
pub const ATTR_LIFESPAN: &str = "Thọ Nguyên";

/// Grouping used to organize the character sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeGroup {
    Identity,
    Body,
    Cultivation,
    Social,
}

/// Attribute values are numeric or free text (e.g. spirit root grade)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(i64),
    Text(String),
}

/// One entry on the character sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub group: AttributeGroup,
    pub value: AttributeValue,
    /// Present for capped attributes (e.g. lifespan); bonuses raise and
    /// lower it together with the value
    #[serde(default)]
    pub max_value: Option<i64>,
}

impl Attribute {
    pub fn number(group: AttributeGroup, value: i64) -> Self {
        Self {
            group,
            value: AttributeValue::Number(value),
            max_value: None,
        }
    }

    pub fn capped(group: AttributeGroup, value: i64, max: i64) -> Self {
        Self {
            group,
            value: AttributeValue::Number(value),
            max_value: Some(max),
        }
    }

    pub fn text(group: AttributeGroup, value: impl Into<String>) -> Self {
        Self {
            group,
            value: AttributeValue::Text(value.into()),
            max_value: None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match &self.value {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(_) => None,
        }
    }
}

/// Whether bonuses are being granted or taken back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusDirection {
    Apply,
    Remove,
}

/// An inventory stack, merged by item name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// A known cultivation technique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A known crafting/alchemy recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Equipment slots on the character
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Artifact,
    Accessory,
}

/// An equipped item and the bonuses it grants while worn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquippedItem {
    pub name: String,
    pub bonuses: StageBonuses,
}

/// Progress along the realm/stage ladder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CultivationState {
    pub realm_index: usize,
    pub stage_index: usize,
    /// Always within `[0, current_stage.qi_required]`
    pub spiritual_qi: u64,
    pub has_conquered_inner_demon: bool,
}

impl Default for CultivationState {
    fn default() -> Self {
        Self {
            realm_index: 0,
            stage_index: 0,
            spiritual_qi: 0,
            has_conquered_inner_demon: false,
        }
    }
}

/// The player character, exclusively owned by `GameState`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub name: String,
    pub attributes: BTreeMap<String, Attribute>,
    pub inventory: Vec<InventoryItem>,
    /// String-keyed integer ledger (e.g. "Linh Thạch Hạ Phẩm")
    pub currencies: BTreeMap<String, i64>,
    pub cultivation: CultivationState,
    pub equipment: BTreeMap<EquipmentSlot, EquippedItem>,
    pub techniques: Vec<Technique>,
    pub recipes: Vec<Recipe>,
    /// Standing with NPCs, keyed by NPC name
    pub relationships: BTreeMap<String, Relationship>,
    /// Destiny path ids whose bonuses have been applied
    pub chosen_destiny_paths: Vec<String>,
}

impl PlayerCharacter {
    pub fn new(name: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_AGE.to_string(), Attribute::number(AttributeGroup::Identity, 16));
        attributes.insert(
            ATTR_LIFESPAN.to_string(),
            Attribute::number(AttributeGroup::Identity, 80),
        );
        attributes.insert("Thể Chất".to_string(), Attribute::number(AttributeGroup::Body, 10));
        attributes.insert(
            "Linh Lực".to_string(),
            Attribute::capped(AttributeGroup::Cultivation, 10, 10),
        );
        attributes.insert("Ngộ Tính".to_string(), Attribute::number(AttributeGroup::Cultivation, 10));
        attributes.insert("Mị Lực".to_string(), Attribute::number(AttributeGroup::Social, 10));

        Self {
            name: name.into(),
            attributes,
            inventory: Vec::new(),
            currencies: BTreeMap::new(),
            cultivation: CultivationState::default(),
            equipment: BTreeMap::new(),
            techniques: Vec::new(),
            recipes: Vec::new(),
            relationships: BTreeMap::new(),
            chosen_destiny_paths: Vec::new(),
        }
    }

    pub fn attribute_number(&self, name: &str) -> Option<i64> {
        self.attributes.get(name).and_then(Attribute::as_number)
    }

    /// Add to a numeric attribute if it exists, clamping to the cap when one
    /// is set. Returns the new value, or `None` when the attribute is
    /// missing or non-numeric.
    pub fn adjust_attribute(&mut self, name: &str, delta: i64) -> Option<i64> {
        let attribute = self.attributes.get_mut(name)?;
        let current = attribute.as_number()?;
        let mut next = current + delta;
        if let Some(max) = attribute.max_value {
            next = next.min(max);
        }
        attribute.value = AttributeValue::Number(next);
        Some(next)
    }

    /// Merge an item into the inventory by name, summing quantities
    pub fn add_item(&mut self, name: &str, quantity: i64, description: Option<String>) {
        if let Some(item) = self.inventory.iter_mut().find(|i| i.name == name) {
            item.quantity += quantity;
            if item.description.is_none() {
                item.description = description;
            }
        } else {
            self.inventory.push(InventoryItem {
                name: name.to_string(),
                quantity,
                description,
            });
        }
    }

    /// Subtract quantity from an item, clamped at 0; stacks that reach 0 are
    /// pruned. Returns how many were actually removed.
    pub fn remove_item(&mut self, name: &str, quantity: i64) -> i64 {
        let Some(pos) = self.inventory.iter().position(|i| i.name == name) else {
            return 0;
        };
        let item = &mut self.inventory[pos];
        let removed = quantity.min(item.quantity).max(0);
        item.quantity -= removed;
        if item.quantity <= 0 {
            self.inventory.remove(pos);
        }
        removed
    }

    pub fn item_quantity(&self, name: &str) -> i64 {
        self.inventory
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Additive update to the named currency ledger entry, creating it if
    /// absent
    pub fn add_currency(&mut self, name: &str, amount: i64) -> i64 {
        let entry = self.currencies.entry(name.to_string()).or_insert(0);
        *entry += amount;
        *entry
    }

    /// One bidirectional bonus routine for stages, destiny paths and
    /// equipment.
    ///
    /// Apply: capped attributes raise max and value together; missing
    /// numeric attributes are created. Remove: the same deltas are
    /// subtracted and the value is clamped so it never exceeds the reduced
    /// max.
    pub fn apply_bonuses(&mut self, bonuses: &StageBonuses, direction: BonusDirection) {
        for (name, delta) in bonuses.iter() {
            let signed = match direction {
                BonusDirection::Apply => *delta,
                BonusDirection::Remove => -*delta,
            };
            let attribute = self
                .attributes
                .entry(name.clone())
                .or_insert_with(|| Attribute::number(AttributeGroup::Cultivation, 0));
            let Some(current) = attribute.as_number() else {
                continue;
            };
            let mut next = current + signed;
            if let Some(max) = attribute.max_value {
                let new_max = max + signed;
                attribute.max_value = Some(new_max);
                next = next.min(new_max);
            }
            attribute.value = AttributeValue::Number(next);
        }
    }

    /// Equip an item into a slot, swapping out (and un-applying) whatever
    /// was there
    pub fn equip(&mut self, slot: EquipmentSlot, item: EquippedItem) -> Option<EquippedItem> {
        let previous = self.unequip(slot);
        self.apply_bonuses(&item.bonuses, BonusDirection::Apply);
        self.equipment.insert(slot, item);
        previous
    }

    /// Remove the item in a slot, taking its bonuses back
    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<EquippedItem> {
        let item = self.equipment.remove(&slot)?;
        self.apply_bonuses(&item.bonuses, BonusDirection::Remove);
        Some(item)
    }

    pub fn learn_technique(&mut self, name: &str, description: Option<String>) -> bool {
        if self.techniques.iter().any(|t| t.name == name) {
            return false;
        }
        self.techniques.push(Technique {
            name: name.to_string(),
            description,
        });
        true
    }

    pub fn learn_recipe(&mut self, name: &str, description: Option<String>) -> bool {
        if self.recipes.iter().any(|r| r.name == name) {
            return false;
        }
        self.recipes.push(Recipe {
            name: name.to_string(),
            description,
        });
        true
    }

    /// Standing with an NPC, creating a neutral entry on first contact
    pub fn relationship_mut(&mut self, npc_name: &str) -> &mut Relationship {
        self.relationships
            .entry(npc_name.to_string())
            .or_default()
    }
}
