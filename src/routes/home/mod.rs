use askama_axum::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::AppState;

#[derive(Template)]
#[template(path = "index.html")]
struct Home {
    source_name: String,
}

pub async fn home(state: State<AppState>) -> Response {
    Home {
        source_name: state.source_name.to_string(),
    }
    .into_response()
}
