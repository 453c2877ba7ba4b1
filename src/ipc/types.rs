use crate::cgpa::CgpaAggregator;
use crate::counter::NameCounter;
use crate::settings::Settings;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Session state for one sidecar process.
#[derive(Debug, Default)]
pub struct AppState {
    pub cgpa: CgpaAggregator,
    pub counter: NameCounter,
    pub nad_course: Option<String>,
    pub settings: Settings,
}
