use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Medvice";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory
/// ~/Medvice/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Medvice")
}

/// Get the models directory (for ONNX embeddings, etc.)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the embedding model directory (paraphrase-multilingual-MiniLM-L12-v2)
pub fn embedding_model_dir() -> PathBuf {
    models_dir().join("paraphrase-multilingual-MiniLM-L12-v2")
}

/// How available appointment slots are produced.
///
/// `Booked` subtracts active bookings from the slot template (production).
/// `Demo` randomly thins the template instead — sandbox behavior that must
/// be asked for explicitly, never the silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMode {
    Booked,
    Demo,
}

impl SlotMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "booked" => Some(Self::Booked),
            "demo" => Some(Self::Demo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Demo => "demo",
        }
    }
}

/// Runtime configuration, read once at startup from `MEDVICE_*` variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP bind address.
    pub bind: SocketAddr,
    /// Path to the disease knowledge corpus (JSON key→record map).
    pub corpus_path: PathBuf,
    /// SQLite database path for the scheduling store.
    pub db_path: PathBuf,
    /// Ollama server base URL.
    pub ollama_url: String,
    /// Ollama model used for answer generation.
    pub ollama_model: String,
    /// Default number of documents retrieved per question.
    pub default_top_k: usize,
    /// Default similarity floor for retrieval.
    pub default_threshold: f32,
    /// Appointment slot generation mode.
    pub slot_mode: SlotMode,
    /// Whether to load the demo seed data at startup.
    pub seed_demo: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind = std::env::var("MEDVICE_BIND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bind);
        let corpus_path = std::env::var("MEDVICE_CORPUS")
            .map(PathBuf::from)
            .unwrap_or(defaults.corpus_path);
        let db_path = std::env::var("MEDVICE_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let ollama_url = std::env::var("MEDVICE_OLLAMA_URL").unwrap_or(defaults.ollama_url);
        let ollama_model = std::env::var("MEDVICE_MODEL").unwrap_or(defaults.ollama_model);
        let default_top_k = std::env::var("MEDVICE_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_top_k);
        let default_threshold = std::env::var("MEDVICE_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_threshold);
        let slot_mode = std::env::var("MEDVICE_SLOT_MODE")
            .ok()
            .and_then(|v| SlotMode::parse(&v))
            .unwrap_or(defaults.slot_mode);
        let seed_demo = std::env::var("MEDVICE_SEED_DEMO")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.seed_demo);

        Self {
            bind,
            corpus_path,
            db_path,
            ollama_url,
            ollama_model,
            default_top_k,
            default_threshold,
            slot_mode,
            seed_demo,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            corpus_path: PathBuf::from("data/hastaliklar.json"),
            db_path: app_data_dir().join("medvice.db"),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "alibayram/medgemma:4b".to_string(),
            default_top_k: 5,
            default_threshold: 0.3,
            slot_mode: SlotMode::Booked,
            seed_demo: true,
        }
    }
}
