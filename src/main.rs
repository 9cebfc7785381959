//! Tu Tiên engine - demo driver
//!
//! Plays a short scripted session against the turn coordinator: a few player
//! actions with canned narrative responses (tags included), then prints the
//! resulting story log and character sheet.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutien_engine::application::ports::outbound::{
    NarrativeError, NarrativePort, NarrativeRequest, NarrativeStream,
};
use tutien_engine::application::services::turn_service::{
    cancellation, PlayerAction, TurnService, TurnStatus,
};
use tutien_engine::domain::aggregates::GameState;
use tutien_engine::domain::entities::{Location, PlayerCharacter};
use tutien_engine::domain::value_objects::GameDate;

/// Replays canned responses in order, chunked to mimic a live stream
struct ScriptedNarrative {
    responses: std::sync::Mutex<Vec<String>>,
}

impl ScriptedNarrative {
    fn new(responses: &[&str]) -> Self {
        let mut responses: Vec<String> = responses.iter().map(|r| r.to_string()).collect();
        responses.reverse();
        Self {
            responses: std::sync::Mutex::new(responses),
        }
    }
}

#[async_trait]
impl NarrativePort for ScriptedNarrative {
    async fn generate(&self, _request: NarrativeRequest) -> Result<NarrativeStream, NarrativeError> {
        let response = self
            .responses
            .lock()
            .map_err(|_| NarrativeError::Unavailable("script poisoned".to_string()))?
            .pop()
            .ok_or_else(|| NarrativeError::Unavailable("script exhausted".to_string()))?;

        // Chop into small chunks so tags land across chunk boundaries.
        let chunks: Vec<Result<String, NarrativeError>> = response
            .chars()
            .collect::<Vec<_>>()
            .chunks(17)
            .map(|c| Ok(c.iter().collect()))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutien_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tu Tiên engine demo");

    let mut state = GameState::new(
        PlayerCharacter::new("Lâm Phong"),
        Location::new("thanh-van-tran", "Thanh Vân Trấn"),
        GameDate::new("Thiên Nguyên", 1, 3),
    );

    let generator = ScriptedNarrative::new(&[
        "Bạn men theo con đường đá ra ngoại ô. Dưới gốc cây cổ thụ, một viên \
         đá lấp lánh linh quang. [ADD_ITEM:{\"name\":\"Linh Thạch Hạ Phẩm\",\
         \"quantity\":3}] Hơi thở linh khí nơi đây khiến bạn khoan khoái.",
        "Trong quán trà, một lão giả chống gậy trúc nhìn bạn cười. \
         [CREATE_NPC:{\"name\":\"Thanh Hư Lão Nhân\",\"description\":\"Lão giả \
         áo xám, mắt sáng như sao\"}] Lão kể về một hang động phía tây. \
         [DISCOVER_LOCATION:{\"id\":\"hang-linh-khi\",\"name\":\"Hang Linh Khí\"}]\
         [ADD_RUMOR:{\"text\":\"Hang Linh Khí từng là động phủ của một vị tiền bối\"}]",
        "Bạn chắp tay thi lễ. Lão nhân gật đầu hài lòng. \
         [UPDATE_RELATIONSHIP:{\"npc_name\":\"Thanh Hư Lão Nhân\",\"delta\":15}] \
         Lão tặng bạn một quyển sách mỏng. [ADD_TECHNIQUE:{\"name\":\"Thanh Tâm \
         Quyết\",\"description\":\"Khẩu quyết tĩnh tâm nhập môn\"}]",
    ]);

    let mut service = TurnService::new(generator);
    let mut rng = StdRng::from_entropy();

    let actions = [
        PlayerAction::new("Ra ngoại ô tìm linh khí tu luyện"),
        PlayerAction::new("Vào quán trà nghe ngóng tin tức"),
        PlayerAction::new("Thi lễ với lão giả và xin thỉnh giáo"),
    ];

    for action in actions {
        let (_cancel_tx, cancel) = cancellation();
        let outcome = service
            .run_turn(&mut state, action, &mut rng, cancel)
            .await?;
        match outcome.status {
            TurnStatus::Completed { changes } => {
                tracing::info!(changes = changes.len(), "turn completed");
            }
            other => tracing::warn!(?other, "turn did not complete"),
        }
    }

    println!("=== {} ===", state.date);
    for entry in &state.story_log {
        println!("[{:?}] {}", entry.kind, entry.content);
    }
    println!();
    println!("Nhân vật: {}", state.player.name);
    for item in &state.player.inventory {
        println!("  Túi đồ: {} x{}", item.name, item.quantity);
    }
    for technique in &state.player.techniques {
        println!("  Công pháp: {}", technique.name);
    }
    for (name, rel) in &state.player.relationships {
        println!("  Quan hệ: {} {} ({})", name, rel.value, rel.status.display_name());
    }
    println!("  Tin đồn: {}", state.rumors.len());
    println!("  Địa điểm đã biết: {}", state.locations.len());

    Ok(())
}
