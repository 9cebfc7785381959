//! Command tag interpreter - extracts `[NAME:{json}]` tags from narrative
//! text and applies them to the game state
//!
//! Scanning is left-to-right and non-overlapping: a recognized name, `:`,
//! then a balanced single-line `{...}` block (brace depth tracked outside
//! JSON strings) whose closing `}` is immediately followed by `]`. Balanced
//! matching is needed because payloads like SHOW_SHOP nest object arrays
//! that themselves end in `}]`. A malformed payload skips that single tag
//! with a logged warning and the rest of the batch still applies.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::aggregates::{GameOverReason, GameState, ShopItem, ShopOffer};
use crate::domain::entities::{Location, Npc, StoryEntry};
use crate::domain::value_objects::{Command, LocationId, TagName};

/// One recognized tag occurrence in the text
#[derive(Debug, Clone, PartialEq, Eq)]
struct TagMatch<'a> {
    name: TagName,
    /// The raw `{...}` payload, JSON-decoded only at apply time
    payload: &'a str,
    /// Byte range of the whole `[NAME:{...}]` span
    start: usize,
    end: usize,
}

/// Scan for recognized tags, left to right, non-overlapping
fn scan(text: &str) -> Vec<TagMatch<'_>> {
    let bytes = text.as_bytes();
    let mut matches = Vec::new();
    let mut pos = 0;

    while let Some(open) = text[pos..].find('[').map(|i| pos + i) {
        pos = open + 1;

        // Tag name: uppercase ASCII and underscores up to ':'
        let mut cursor = open + 1;
        while cursor < bytes.len() && (bytes[cursor].is_ascii_uppercase() || bytes[cursor] == b'_')
        {
            cursor += 1;
        }
        if cursor >= bytes.len() || bytes[cursor] != b':' {
            continue;
        }
        let Some(name) = TagName::parse(&text[open + 1..cursor]) else {
            continue;
        };

        let brace = cursor + 1;
        if brace >= bytes.len() || bytes[brace] != b'{' {
            continue;
        }

        let Some(close) = find_payload_end(bytes, brace) else {
            continue;
        };
        if close + 1 >= bytes.len() || bytes[close + 1] != b']' {
            continue;
        }

        matches.push(TagMatch {
            name,
            payload: &text[brace..=close],
            start: open,
            end: close + 2,
        });
        pos = close + 2;
    }

    matches
}

/// Byte index of the `}` closing the brace block opened at `open`, tracking
/// depth outside JSON strings and honoring `\` escapes inside them. The
/// block may not span lines.
fn find_payload_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == b'\n' {
            return None;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove every recognized tag span, leaving surrounding text intact
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in scan(text) {
        out.push_str(&text[last..m.start]);
        last = m.end;
    }
    out.push_str(&text[last..]);
    out
}

/// Individual state changes performed by a batch (for broadcasting/logging)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateChange {
    ItemAdded { name: String, quantity: i64 },
    ItemRemoved { name: String, quantity: i64 },
    CurrencyChanged { name: String, amount: i64, balance: i64 },
    NpcCreated { name: String },
    LocationDiscovered { id: String, name: String },
    RumorAdded { text: String },
    ShopOffered { item_count: usize },
    RelationshipChanged { npc_name: String, value: i32, status: String },
    GameOver { reason: Option<String> },
    TechniqueLearned { name: String },
    AttributeChanged { name: String, delta: i64, value: i64 },
    RecipeLearned { name: String },
}

/// Result of interpreting one complete narrative response
#[derive(Debug, Clone)]
pub struct InterpreterOutcome {
    /// Changes actually performed, in tag order
    pub changes: Vec<StateChange>,
    /// Player-visible narrative with tags stripped; `None` when nothing but
    /// tags/whitespace remained (the entry should be discarded)
    pub visible_text: Option<String>,
    /// Tags quarantined for malformed payloads
    pub skipped: u32,
}

/// Applies command tags extracted from completed narrative text
#[derive(Debug, Default)]
pub struct TagInterpreter;

impl TagInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Interpret one complete narrative response: extract tags, apply each
    /// in order (quarantining malformed payloads), and compute the stripped
    /// player-visible text.
    pub fn apply_narrative(&self, state: &mut GameState, text: &str) -> InterpreterOutcome {
        let mut changes = Vec::new();
        let mut skipped = 0;

        for m in scan(text) {
            match Command::decode(m.name, m.payload) {
                Ok(command) => {
                    if let Some(change) = self.apply_command(state, command) {
                        changes.push(change);
                    }
                }
                Err(e) => {
                    warn!(tag = %m.name, error = %e, "malformed tag payload, skipping");
                    skipped += 1;
                }
            }
        }

        let stripped = strip_tags(text);
        let trimmed = stripped.trim();
        let visible_text = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };

        InterpreterOutcome {
            changes,
            visible_text,
            skipped,
        }
    }

    /// Apply one decoded command. Returns `None` for idempotent no-ops.
    fn apply_command(&self, state: &mut GameState, command: Command) -> Option<StateChange> {
        match command {
            Command::AddItem(p) => {
                state.player.add_item(&p.name, p.quantity, p.description);
                Some(StateChange::ItemAdded {
                    name: p.name,
                    quantity: p.quantity,
                })
            }
            Command::RemoveItem(p) => {
                let removed = state.player.remove_item(&p.name, p.quantity);
                Some(StateChange::ItemRemoved {
                    name: p.name,
                    quantity: removed,
                })
            }
            Command::AddCurrency(p) => {
                let balance = state.player.add_currency(&p.name, p.amount);
                Some(StateChange::CurrencyChanged {
                    name: p.name,
                    amount: p.amount,
                    balance,
                })
            }
            Command::CreateNpc(p) => {
                let location_id = p
                    .location_id
                    .map(LocationId::new)
                    .filter(|id| state.locations.contains_key(id))
                    .unwrap_or_else(|| state.current_location_id.clone());
                let mut npc = Npc::new(p.name.clone(), location_id);
                if let Some(description) = p.description {
                    npc = npc.with_description(description);
                }
                if state.add_npc(npc) {
                    Some(StateChange::NpcCreated { name: p.name })
                } else {
                    debug!(name = %p.name, "npc already exists, ignoring CREATE_NPC");
                    None
                }
            }
            Command::DiscoverLocation(p) => {
                let mut location = Location::new(p.id.clone(), p.name.clone());
                if let Some(description) = p.description {
                    location = location.with_description(description);
                }
                let origin = state.current_location_id.clone();
                if state.discover_location(location, &origin) {
                    Some(StateChange::LocationDiscovered {
                        id: p.id,
                        name: p.name,
                    })
                } else {
                    debug!(id = %p.id, "location already known, ignoring DISCOVER_LOCATION");
                    None
                }
            }
            Command::AddRumor(p) => {
                state.rumors.push(p.text.clone());
                Some(StateChange::RumorAdded { text: p.text })
            }
            Command::ShowShop(p) => {
                let item_count = p.items.len();
                state.pending_shop = Some(ShopOffer {
                    shop_name: p.shop_name,
                    items: p
                        .items
                        .into_iter()
                        .map(|i| ShopItem {
                            name: i.name,
                            price: i.price,
                            description: i.description,
                        })
                        .collect(),
                });
                Some(StateChange::ShopOffered { item_count })
            }
            Command::UpdateRelationship(p) => {
                let relationship = state.player.relationship_mut(&p.npc_name);
                relationship.apply_delta(p.delta);
                Some(StateChange::RelationshipChanged {
                    npc_name: p.npc_name,
                    value: relationship.value,
                    status: relationship.status.display_name().to_string(),
                })
            }
            Command::Death(p) => {
                // The terminal flag is set here; the rest of the batch still
                // applies so story and state stay in sync.
                if state.game_over.is_none() {
                    state.game_over = Some(GameOverReason::Death {
                        reason: p.reason.clone(),
                    });
                }
                Some(StateChange::GameOver { reason: p.reason })
            }
            Command::AddTechnique(p) => {
                if state.player.learn_technique(&p.name, p.description) {
                    Some(StateChange::TechniqueLearned { name: p.name })
                } else {
                    None
                }
            }
            Command::UpdateAttribute(p) => match state.player.adjust_attribute(&p.name, p.delta) {
                Some(value) => {
                    state.push_entry(StoryEntry::system(format!(
                        "{} {:+} (hiện tại: {})",
                        p.name, p.delta, value
                    )));
                    Some(StateChange::AttributeChanged {
                        name: p.name,
                        delta: p.delta,
                        value,
                    })
                }
                None => {
                    debug!(name = %p.name, "unknown or non-numeric attribute, ignoring UPDATE_ATTRIBUTE");
                    None
                }
            },
            Command::AddRecipe(p) => {
                if state.player.learn_recipe(&p.name, p.description) {
                    Some(StateChange::RecipeLearned { name: p.name })
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{PlayerCharacter, StoryEntryKind};
    use crate::domain::value_objects::GameDate;

    fn state() -> GameState {
        GameState::new(
            PlayerCharacter::new("Lâm Phong"),
            Location::new("thanh-van-tran", "Thanh Vân Trấn"),
            GameDate::new("Thiên Nguyên", 1, 3),
        )
    }

    #[test]
    fn add_item_tag_in_vietnamese_text() {
        let mut state = state();
        let text = r#"Bạn thấy [ADD_ITEM:{"name":"Linh Thạch","quantity":5}] nơi góc tường."#;

        let outcome = TagInterpreter::new().apply_narrative(&mut state, text);

        assert_eq!(state.player.item_quantity("Linh Thạch"), 5);
        assert_eq!(outcome.visible_text.as_deref(), Some("Bạn thấy  nơi góc tường."));
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn malformed_payload_is_quarantined_but_batch_continues() {
        let mut state = state();
        let text = concat!(
            r#"[ADD_ITEM:{"name":"A","quantity":}] hỏng, "#,
            r#"[ADD_CURRENCY:{"name":"Linh Thạch Hạ Phẩm","amount":10}] vẫn chạy."#
        );

        let outcome = TagInterpreter::new().apply_narrative(&mut state, text);

        assert_eq!(outcome.skipped, 1);
        assert_eq!(state.player.currencies["Linh Thạch Hạ Phẩm"], 10);
        assert!(state.player.inventory.is_empty());
        // The malformed tag still matched the grammar, so it is stripped.
        assert_eq!(outcome.visible_text.as_deref(), Some("hỏng,  vẫn chạy."));
    }

    #[test]
    fn unknown_tag_names_stay_plain_text() {
        let mut state = state();
        let text = r#"[GIVE_GOLD:{"amount":10}] không phải lệnh."#;

        let outcome = TagInterpreter::new().apply_narrative(&mut state, text);

        assert!(outcome.changes.is_empty());
        assert_eq!(
            outcome.visible_text.as_deref(),
            Some(r#"[GIVE_GOLD:{"amount":10}] không phải lệnh."#)
        );
    }

    #[test]
    fn payload_may_not_span_lines() {
        let mut state = state();
        let text = "[ADD_RUMOR:{\"text\":\n\"xuống dòng\"}] vẫn là chữ.";

        let outcome = TagInterpreter::new().apply_narrative(&mut state, text);

        assert!(state.rumors.is_empty());
        assert_eq!(outcome.visible_text.as_deref(), Some(text.trim()));
    }

    #[test]
    fn tag_only_text_discards_the_entry() {
        let mut state = state();
        let text = r#"  [ADD_RUMOR:{"text":"Tin đồn"}]  "#;

        let outcome = TagInterpreter::new().apply_narrative(&mut state, text);

        assert_eq!(state.rumors, vec!["Tin đồn".to_string()]);
        assert!(outcome.visible_text.is_none());
    }

    #[test]
    fn discover_location_is_idempotent_and_bidirectional() {
        let mut state = state();
        let tag = r#"[DISCOVER_LOCATION:{"id":"hang-linh-khi","name":"Hang Linh Khí"}]"#;
        let interpreter = TagInterpreter::new();

        let first = interpreter.apply_narrative(&mut state, tag);
        assert_eq!(first.changes.len(), 1);
        let origin = state.current_location_id.clone();
        let cave = LocationId::new("hang-linh-khi");
        assert!(state.location(&origin).unwrap().neighbors.contains(&cave));
        assert!(state.location(&cave).unwrap().neighbors.contains(&origin));

        let again = interpreter.apply_narrative(&mut state, tag);
        assert!(again.changes.is_empty());
        assert_eq!(state.locations.len(), 2);
    }

    #[test]
    fn relationship_tag_clamps_and_rederives_status() {
        let mut state = state();
        let interpreter = TagInterpreter::new();
        interpreter.apply_narrative(
            &mut state,
            r#"[UPDATE_RELATIONSHIP:{"npc_name":"Hàn Lập","delta":-60}]"#,
        );

        let rel = &state.player.relationships["Hàn Lập"];
        assert_eq!(rel.value, -60);
        assert_eq!(rel.status.display_name(), "Thù địch");
    }

    #[test]
    fn death_does_not_halt_the_rest_of_the_batch() {
        let mut state = state();
        let text = concat!(
            r#"[DEATH:{"reason":"Trúng kịch độc"}]"#,
            r#"[ADD_ITEM:{"name":"Di Vật","quantity":1}]"#
        );

        let outcome = TagInterpreter::new().apply_narrative(&mut state, text);

        assert!(matches!(
            state.game_over,
            Some(GameOverReason::Death { .. })
        ));
        assert_eq!(state.player.item_quantity("Di Vật"), 1);
        assert_eq!(outcome.changes.len(), 2);
    }

    #[test]
    fn update_attribute_logs_a_system_note() {
        let mut state = state();
        TagInterpreter::new().apply_narrative(
            &mut state,
            r#"Hít thở linh khí. [UPDATE_ATTRIBUTE:{"name":"Ngộ Tính","delta":2}]"#,
        );

        assert_eq!(state.player.attribute_number("Ngộ Tính"), Some(12));
        let note = state
            .story_log
            .iter()
            .find(|e| e.kind == StoryEntryKind::System)
            .expect("system note");
        assert!(note.content.contains("Ngộ Tính"));
        assert!(note.content.contains("+2"));
    }

    #[test]
    fn update_attribute_on_unknown_name_is_ignored() {
        let mut state = state();
        let outcome = TagInterpreter::new().apply_narrative(
            &mut state,
            r#"[UPDATE_ATTRIBUTE:{"name":"Không Có","delta":2}]"#,
        );
        assert!(outcome.changes.is_empty());
        assert!(state.story_log.is_empty());
    }

    #[test]
    fn show_shop_stages_a_pending_offer() {
        let mut state = state();
        TagInterpreter::new().apply_narrative(
            &mut state,
            r#"[SHOW_SHOP:{"shop_name":"Vạn Bảo Lâu","items":[{"name":"Hồi Khí Đan","price":50}]}]"#,
        );

        let shop = state.pending_shop.as_ref().expect("shop staged");
        assert_eq!(shop.shop_name.as_deref(), Some("Vạn Bảo Lâu"));
        assert_eq!(shop.items.len(), 1);
        assert_eq!(shop.items[0].price, 50);
    }

    #[test]
    fn braces_inside_payload_strings_do_not_close_the_tag() {
        let mut state = state();
        let outcome = TagInterpreter::new().apply_narrative(
            &mut state,
            r#"[ADD_RUMOR:{"text":"trận đồ hình {càn khôn} hiểm ác"}] xong."#,
        );
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(state.rumors[0], "trận đồ hình {càn khôn} hiểm ác");
        assert_eq!(outcome.visible_text.as_deref(), Some("xong."));
    }

    #[test]
    fn create_npc_defaults_to_current_location() {
        let mut state = state();
        TagInterpreter::new().apply_narrative(
            &mut state,
            r#"[CREATE_NPC:{"name":"Lão Ăn Mày","description":"Áo rách"}]"#,
        );

        let npc = state.find_npc("Lão Ăn Mày").expect("npc created");
        assert_eq!(npc.location_id, state.current_location_id);
        assert!(!npc.is_canon);
    }

    #[test]
    fn add_then_remove_round_trip_via_tags() {
        let mut state = state();
        let interpreter = TagInterpreter::new();
        let before: Vec<String> =
            state.player.inventory.iter().map(|i| i.name.clone()).collect();

        interpreter.apply_narrative(&mut state, r#"[ADD_ITEM:{"name":"X","quantity":3}]"#);
        interpreter.apply_narrative(&mut state, r#"[REMOVE_ITEM:{"name":"X","quantity":3}]"#);

        let after: Vec<String> =
            state.player.inventory.iter().map(|i| i.name.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn scanner_finds_multiple_tags_left_to_right() {
        let text = concat!(
            r#"đầu [ADD_RUMOR:{"text":"một"}] giữa "#,
            r#"[ADD_RUMOR:{"text":"hai"}] cuối"#
        );
        let mut state = state();
        TagInterpreter::new().apply_narrative(&mut state, text);
        assert_eq!(state.rumors, vec!["một".to_string(), "hai".to_string()]);
    }

    #[test]
    fn partial_tag_is_left_untouched() {
        let mut state = state();
        let text = r#"chưa xong [ADD_ITEM:{"name":"Linh"#;
        let outcome = TagInterpreter::new().apply_narrative(&mut state, text);
        assert!(outcome.changes.is_empty());
        assert_eq!(outcome.visible_text.as_deref(), Some(text.trim()));
    }
}
