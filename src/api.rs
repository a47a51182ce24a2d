//! REST API for the packing service.
//!
//! Provides HTTP endpoints for submitting batches of orders to be packed.
//! Uses Axum as the web framework and supports CORS.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, EngineConfig};
use crate::dimensions::Dimensions;
use crate::model::{BoxCatalog, Item, OrderResult, ValidationError};
use crate::optimizer::{self, PackingError};

#[derive(Clone)]
struct ApiState {
    catalog: Arc<BoxCatalog>,
    engine: EngineConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pack-optimizer API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Wire representation of a product's dimensions, in the vocabulary the
/// original fulfillment system uses end to end.
#[derive(Deserialize, Clone, Copy, ToSchema)]
pub struct DimensoesWire {
    pub altura: i64,
    pub largura: i64,
    pub comprimento: i64,
}

/// A single product within a pedido.
#[derive(Deserialize, Clone, ToSchema)]
pub struct ProdutoWire {
    pub produto_id: String,
    pub dimensoes: DimensoesWire,
}

/// A single order to be packed.
#[derive(Deserialize, Clone, ToSchema)]
pub struct PedidoWire {
    pub pedido_id: i64,
    pub produtos: Vec<ProdutoWire>,
}

/// Request body for `POST /pack`: a batch of orders.
#[derive(Deserialize, Clone, ToSchema)]
#[schema(
    example = json!({
        "pedidos": [
            {
                "pedido_id": 1,
                "produtos": [
                    { "produto_id": "sku-1", "dimensoes": { "altura": 10, "largura": 10, "comprimento": 10 } }
                ]
            }
        ]
    })
)]
pub struct PackRequest {
    pub pedidos: Vec<PedidoWire>,
}

#[derive(Debug)]
enum PackRequestValidationError {
    EmptyBatch,
    EmptyPedido { pedido_id: i64 },
    InvalidProduto { pedido_id: i64, source: ValidationError },
    DimensionOutOfRange { pedido_id: i64, produto_id: String },
}

impl std::fmt::Display for PackRequestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackRequestValidationError::EmptyBatch => {
                write!(f, "pedidos must not be empty")
            }
            PackRequestValidationError::EmptyPedido { pedido_id } => {
                write!(f, "pedido {pedido_id} has no produtos")
            }
            PackRequestValidationError::InvalidProduto { pedido_id, source } => {
                write!(f, "pedido {pedido_id}: {source}")
            }
            PackRequestValidationError::DimensionOutOfRange {
                pedido_id,
                produto_id,
            } => write!(
                f,
                "pedido {pedido_id}, produto {produto_id}: dimensions must be positive integers no greater than {}",
                u32::MAX
            ),
        }
    }
}

struct ValidatedPedido {
    pedido_id: i64,
    items: Vec<Item>,
}

fn validate_request(request: PackRequest) -> Result<Vec<ValidatedPedido>, PackRequestValidationError> {
    if request.pedidos.is_empty() {
        return Err(PackRequestValidationError::EmptyBatch);
    }

    request
        .pedidos
        .into_iter()
        .map(|pedido| {
            if pedido.produtos.is_empty() {
                return Err(PackRequestValidationError::EmptyPedido {
                    pedido_id: pedido.pedido_id,
                });
            }

            let items = pedido
                .produtos
                .into_iter()
                .enumerate()
                .map(|(index, produto)| {
                    let d = produto.dimensoes;
                    let in_range = |value: i64| u32::try_from(value).is_ok_and(|v| v >= 1);
                    if !in_range(d.altura) || !in_range(d.largura) || !in_range(d.comprimento) {
                        return Err(PackRequestValidationError::DimensionOutOfRange {
                            pedido_id: pedido.pedido_id,
                            produto_id: produto.produto_id.clone(),
                        });
                    }
                    let dimensions = Dimensions::new(
                        d.altura as u32,
                        d.largura as u32,
                        d.comprimento as u32,
                    );
                    Item::new(produto.produto_id, dimensions, index).map_err(|source| {
                        PackRequestValidationError::InvalidProduto {
                            pedido_id: pedido.pedido_id,
                            source,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(ValidatedPedido {
                pedido_id: pedido.pedido_id,
                items,
            })
        })
        .collect()
}

/// A packed box within a pedido's response.
#[derive(Serialize, ToSchema)]
pub struct CaixaWire {
    pub caixa_id: String,
    pub produtos: Vec<String>,
}

/// The packing result for a single pedido.
#[derive(Serialize, ToSchema)]
pub struct PedidoResponse {
    pub pedido_id: i64,
    pub caixas: Vec<CaixaWire>,
}

/// Response body for `POST /pack`: one entry per request pedido, in
/// request order.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub pedidos: Vec<PedidoResponse>,
}

impl From<OrderResult> for Vec<CaixaWire> {
    fn from(result: OrderResult) -> Self {
        result
            .boxes
            .into_iter()
            .map(|b| CaixaWire {
                caixa_id: b.box_type_id,
                produtos: b.products,
            })
            .collect()
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl ErrorResponse {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Wire envelope for every error response: `{ "error": { "code", "message" } }`.
#[derive(Serialize, ToSchema)]
struct ErrorEnvelope {
    error: ErrorResponse,
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorEnvelope {
            error: ErrorResponse::new(code, message),
        }),
    )
        .into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
}

fn validation_error(err: PackRequestValidationError) -> Response {
    error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
}

fn packing_error(pedido_id: i64, err: PackingError) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "PACKING_ERROR",
        format!("pedido {pedido_id}: {err}"),
    )
}

#[derive(Serialize, ToSchema)]
struct HealthResponse {
    status: &'static str,
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_healthz),
    components(schemas(
        PackRequest,
        PedidoWire,
        ProdutoWire,
        DimensoesWire,
        PackResponse,
        PedidoResponse,
        CaixaWire,
        ErrorResponse,
        ErrorEnvelope,
        HealthResponse
    )),
    tags((name = "packing", description = "Endpoints for order packing"))
)]
struct ApiDoc;

/// Starts the API server, binding according to the given config.
///
/// Configures CORS for cross-origin requests and blocks until the
/// server is terminated.
pub async fn start_api_server(config: ApiConfig, engine: EngineConfig, catalog: BoxCatalog) {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState {
        catalog: Arc::new(catalog),
        engine,
    };

    let app = Router::new()
        .route("/pack", post(handle_pack))
        .route("/healthz", get(handle_healthz))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            panic!("❌ Could not bind API server to {}: {}", addr, err);
        }
    };

    let display_host = config.display_host().to_string();
    println!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        println!("💡 Local access: http://localhost:{}", config.port());
    }
    println!("📦 API Endpoints:");
    println!("   - POST /pack");
    println!("   - GET /healthz");
    println!("📑 Documentation:");
    println!("   - GET /docs");
    println!("   - GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        eprintln!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for `POST /pack`: packs a batch of orders against the shared
/// reference box catalog and returns one result per pedido, in request
/// order.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "All pedidos packed successfully", body = PackResponse),
        (status = 400, description = "Malformed or invalid request", body = ErrorResponse),
        (status = 422, description = "A pedido could not be packed", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    let pedido_count = payload.pedidos.len();
    let validated = match validate_request(payload) {
        Ok(validated) => validated,
        Err(err) => return validation_error(err),
    };

    println!("📥 New pack request: {} pedidos", pedido_count);

    let mut tasks = Vec::with_capacity(validated.len());
    for pedido in validated {
        let catalog = Arc::clone(&state.catalog);
        let allow_rotation = state.engine.allow_rotation;
        let pedido_id = pedido.pedido_id;
        let handle = tokio::task::spawn_blocking(move || {
            let result = optimizer::pack_order(pedido.items, &catalog, allow_rotation);
            (pedido_id, result)
        });
        tasks.push(handle);
    }

    let outcomes = futures::future::join_all(tasks).await;

    let mut pedidos = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let (pedido_id, result) = match outcome {
            Ok(outcome) => outcome,
            Err(join_err) => {
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    join_err.to_string(),
                );
            }
        };
        match result {
            Ok(order_result) => pedidos.push(PedidoResponse {
                pedido_id,
                caixas: order_result.into(),
            }),
            Err(err) => return packing_error(pedido_id, err),
        }
    }

    println!("📦 Result: {} pedidos packed", pedidos.len());
    (StatusCode::OK, Json(PackResponse { pedidos })).into_response()
}

/// Handler for `GET /healthz`: liveness probe.
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Service is serving traffic", body = HealthResponse)),
    tag = "packing"
)]
async fn handle_healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/pack"), "missing /pack path");
        assert!(paths.contains_key("/healthz"), "missing /healthz path");
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc.components.as_ref().expect("no components");
        for name in ["PackRequest", "PackResponse", "ErrorResponse"] {
            assert!(
                components.schemas.contains_key(name),
                "expected schema '{}' missing",
                name
            );
        }
    }

    #[test]
    fn validate_request_rejects_empty_batch() {
        let request = PackRequest { pedidos: vec![] };
        assert!(matches!(
            validate_request(request),
            Err(PackRequestValidationError::EmptyBatch)
        ));
    }

    #[test]
    fn validate_request_rejects_empty_pedido() {
        let request = PackRequest {
            pedidos: vec![PedidoWire {
                pedido_id: 1,
                produtos: vec![],
            }],
        };
        assert!(matches!(
            validate_request(request),
            Err(PackRequestValidationError::EmptyPedido { pedido_id: 1 })
        ));
    }

    #[test]
    fn validate_request_rejects_non_positive_dimension() {
        let request = PackRequest {
            pedidos: vec![PedidoWire {
                pedido_id: 1,
                produtos: vec![ProdutoWire {
                    produto_id: "sku-1".to_string(),
                    dimensoes: DimensoesWire {
                        altura: 0,
                        largura: 10,
                        comprimento: 10,
                    },
                }],
            }],
        };
        assert!(matches!(
            validate_request(request),
            Err(PackRequestValidationError::DimensionOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_request_rejects_dimension_above_u32_max() {
        let request = PackRequest {
            pedidos: vec![PedidoWire {
                pedido_id: 1,
                produtos: vec![ProdutoWire {
                    produto_id: "sku-1".to_string(),
                    dimensoes: DimensoesWire {
                        altura: i64::from(u32::MAX) + 1,
                        largura: 10,
                        comprimento: 10,
                    },
                }],
            }],
        };
        assert!(matches!(
            validate_request(request),
            Err(PackRequestValidationError::DimensionOutOfRange { .. })
        ));
    }

    #[test]
    fn validate_request_rejects_empty_produto_id() {
        let request = PackRequest {
            pedidos: vec![PedidoWire {
                pedido_id: 1,
                produtos: vec![ProdutoWire {
                    produto_id: String::new(),
                    dimensoes: DimensoesWire {
                        altura: 10,
                        largura: 10,
                        comprimento: 10,
                    },
                }],
            }],
        };
        assert!(matches!(
            validate_request(request),
            Err(PackRequestValidationError::InvalidProduto { .. })
        ));
    }

    fn test_state(engine: EngineConfig) -> ApiState {
        ApiState {
            catalog: Arc::new(BoxCatalog::reference()),
            engine,
        }
    }

    #[tokio::test]
    async fn handle_pack_rejects_empty_batch_with_400() {
        let state = test_state(EngineConfig { allow_rotation: true });
        let response = handle_pack(State(state), Ok(Json(PackRequest { pedidos: vec![] }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn handle_pack_reports_422_for_unpackable_item() {
        let state = test_state(EngineConfig { allow_rotation: false });
        let request = PackRequest {
            pedidos: vec![PedidoWire {
                pedido_id: 1,
                produtos: vec![ProdutoWire {
                    produto_id: "GIGANTE".to_string(),
                    dimensoes: DimensoesWire {
                        altura: 999,
                        largura: 999,
                        comprimento: 999,
                    },
                }],
            }],
        };
        let response = handle_pack(State(state), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn handle_pack_preserves_batch_order() {
        let state = test_state(EngineConfig { allow_rotation: false });
        let produto = |id: &str| ProdutoWire {
            produto_id: id.to_string(),
            dimensoes: DimensoesWire {
                altura: 10,
                largura: 10,
                comprimento: 10,
            },
        };
        let request = PackRequest {
            pedidos: vec![
                PedidoWire {
                    pedido_id: 3,
                    produtos: vec![produto("a")],
                },
                PedidoWire {
                    pedido_id: 1,
                    produtos: vec![produto("b")],
                },
                PedidoWire {
                    pedido_id: 2,
                    produtos: vec![produto("c")],
                },
            ],
        };
        let response = handle_pack(State(state), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let ids: Vec<i64> = parsed["pedidos"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["pedido_id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn handle_healthz_reports_ok() {
        let response = handle_healthz().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn validate_request_preserves_input_index_per_pedido() {
        let request = PackRequest {
            pedidos: vec![PedidoWire {
                pedido_id: 1,
                produtos: vec![
                    ProdutoWire {
                        produto_id: "a".to_string(),
                        dimensoes: DimensoesWire {
                            altura: 1,
                            largura: 1,
                            comprimento: 1,
                        },
                    },
                    ProdutoWire {
                        produto_id: "b".to_string(),
                        dimensoes: DimensoesWire {
                            altura: 2,
                            largura: 2,
                            comprimento: 2,
                        },
                    },
                ],
            }],
        };
        let validated = validate_request(request).expect("should validate");
        assert_eq!(validated[0].items[0].input_index, 0);
        assert_eq!(validated[0].items[1].input_index, 1);
    }
}
