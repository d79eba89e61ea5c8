//! Demo resource handlers
//!
//! Parameterised routes whose metrics collapse onto the `/widgets/{id}`
//! template regardless of the concrete id.

use axum::{Json, extract::Path, http::StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Widget {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewWidget {
    pub name: String,
}

/// `GET /widgets/{id}`
pub async fn show(Path(id): Path<u64>) -> Json<Widget> {
    Json(Widget {
        id,
        name: format!("widget-{id}"),
    })
}

/// `POST /widgets`
pub async fn create(Json(new): Json<NewWidget>) -> (StatusCode, Json<Widget>) {
    tracing::debug!(name = %new.name, "Creating widget");
    (
        StatusCode::CREATED,
        Json(Widget {
            id: 1,
            name: new.name,
        }),
    )
}
