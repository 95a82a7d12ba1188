use std::net::SocketAddr;

use anyhow::Context;
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;
use utoipa::ToSchema;

use metapi_core::{ApiModel, ApiOperation, BodySource, JsonSchema, MetaApiClient};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Pet {
    pub id: u64,
    pub name: String,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewPet {
    pub name: String,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

fn rex() -> Pet {
    Pet {
        id: 1,
        name: "Rex".to_string(),
        tag: Some("dog".to_string()),
    }
}

async fn list_pets(Query(query): Query<ListQuery>) -> Json<Vec<Pet>> {
    let pets = vec![
        rex(),
        Pet {
            id: 2,
            name: "Felix".to_string(),
            tag: None,
        },
    ];
    let limit = query.limit.unwrap_or(pets.len());
    Json(pets.into_iter().take(limit).collect())
}

async fn get_pet(Path(id): Path<u64>) -> impl IntoResponse {
    match id {
        1 => (StatusCode::OK, Json(json!(rex()))),
        // drifted contract: the name is gone
        2 => (StatusCode::OK, Json(json!({"id": 2}))),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": format!("pet {id} not found")})),
        ),
    }
}

async fn create_pet(headers: HeaderMap, Json(pet): Json<NewPet>) -> impl IntoResponse {
    if !headers.contains_key("x-request-id") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "missing x-request-id"})),
        );
    }
    let created = Pet {
        id: 10,
        name: pet.name,
        tag: pet.tag,
    };
    (StatusCode::CREATED, Json(json!(created)))
}

async fn delete_pet(Path(_id): Path<u64>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn failing() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

fn router() -> Router {
    Router::new()
        .route("/api/pets", get(list_pets).post(create_pet))
        .route("/api/pets/{id}", get(get_pet).delete(delete_pet))
        .route("/api/failing", get(failing))
}

pub fn model() -> anyhow::Result<ApiModel> {
    let pet = JsonSchema::of::<Pet>()?;
    let pets = JsonSchema::new(
        "Pets",
        json!({"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}),
    )
    .with_definition("Pet", pet.as_value().clone());
    let id_request = JsonSchema::new(
        "PetId",
        json!({
            "type": "object",
            "required": ["id"],
            "properties": { "id": { "type": "integer", "minimum": 1 } }
        }),
    );
    let create_request = JsonSchema::new(
        "CreatePet",
        json!({
            "type": "object",
            "required": ["x-request-id", "pet"],
            "properties": {
                "x-request-id": { "type": "string" },
                "pet": { "$ref": "#/components/schemas/NewPet" }
            }
        }),
    )
    .with_definition(
        "NewPet",
        JsonSchema::of::<NewPet>()?.as_value().clone(),
    );

    let model = ApiModel::new()
        .with_operation(
            ApiOperation::new("listPets", Method::GET, "/pets")
                .with_query_params(["limit"])
                .with_response(StatusCode::OK, pets),
        )
        .with_operation(
            ApiOperation::new("getPet", Method::GET, "/pets/{id}")
                .with_request_schema(id_request.clone())
                .with_response(StatusCode::OK, pet.clone()),
        )
        .with_operation(
            ApiOperation::new("createPet", Method::POST, "/pets")
                .with_header_params(["x-request-id"])
                .with_body(BodySource::Field("pet".to_string()))
                .with_request_schema(create_request)
                .with_response(StatusCode::CREATED, pet),
        )
        .with_operation(
            ApiOperation::new("deletePet", Method::DELETE, "/pets/{id}")
                .with_request_schema(id_request),
        )
        .with_operation(ApiOperation::new("failing", Method::GET, "/failing"));
    Ok(model)
}

#[derive(Debug)]
pub struct TestApp {
    pub client: MetaApiClient,
    pub addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestApp {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind test listener")?;
        let addr = listener.local_addr()?;
        info!(%addr, "launching server");
        let server = tokio::spawn(async move {
            axum::serve(listener, router())
                .await
                .expect("server should run");
        });

        let client = MetaApiClient::builder()
            .with_port(addr.port())
            .with_base_path("/api")?
            .with_model(model()?)
            .build()?;

        Ok(Self {
            client,
            addr,
            server,
        })
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}
