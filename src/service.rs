//! Request handlers behind the visualizer's backend.
//!
//! Each handler takes a JSON request body and produces a JSON reply together
//! with an HTTP-like status. Successful replies are `{"haddr": n}` for
//! [`Endpoint::MaxRegister`] and `{"result": ...}` for
//! [`Endpoint::RunProgram`]; failures are `{"error": "..."}` on both. Routing, CORS and static files belong to
//! whatever server embeds these handlers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::codec::{EncodeError, MalformedProgram, ProgramDocument, RunDocument, decode, encode};
use crate::runtime::{RegisterBank, RegisterError, Vm, VmConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Register count needed by a program (`highest_address + 1`).
    MaxRegister,
    /// Traced run of a program.
    RunProgram,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::MaxRegister => "/get_max_register",
            Endpoint::RunProgram => "/run_urm_program",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        [Endpoint::MaxRegister, Endpoint::RunProgram]
            .into_iter()
            .find(|endpoint| endpoint.path() == path)
    }
}

/// Body of a [`Endpoint::RunProgram`] request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub program: ProgramDocument,

    #[serde(alias = "initialRegisters", default)]
    pub initial_registers: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxRegisterReply {
    pub haddr: usize,
}

/// Reply envelope: `{"result": T}` or `{"error": "message"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reply<T> {
    Result(T),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    InternalError,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::InternalError => 500,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, Status::Ok)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub body: String,
}

impl Response {
    fn new<T: Serialize + ?Sized>(status: Status, reply: &T) -> Self {
        match serde_json::to_string(reply) {
            Ok(body) => Self { status, body },
            Err(err) => Self {
                status: Status::InternalError,
                body: serde_json::json!({ "error": err.to_string() }).to_string(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed program: {0}")]
    Malformed(#[from] MalformedProgram),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Register count for a program, bounded by the run limit so that every
/// answer is a bank [`run_program`] would accept.
pub fn max_register(document: &ProgramDocument) -> Result<MaxRegisterReply, ServiceError> {
    let (program, _) = decode(document)?;
    let highest = program.highest_address();
    let limit = VmConfig::default().max_registers;
    if highest >= limit {
        return Err(RegisterError::BeyondLimit {
            index: highest,
            limit,
        }
        .into());
    }
    Ok(MaxRegisterReply { haddr: highest + 1 })
}

/// Decodes and runs the requested program, returning the full trace.
pub fn run_program(request: &RunRequest) -> Result<RunDocument, ServiceError> {
    let (program, safety_count) = decode(&request.program)?;
    let registers = RegisterBank::from_signed(&request.initial_registers)?;
    let execution = Vm::with_safety_count(safety_count).run(&program, registers)?;
    info!(
        instructions = program.len(),
        steps = execution.steps(),
        halt = ?execution.halt,
        "program ran"
    );
    Ok(RunDocument::new(encode(&program, safety_count)?, &execution)?)
}

/// Dispatches a raw JSON request body to the handler for `endpoint`.
#[instrument(level = "debug", skip(body), fields(path = endpoint.path(), bytes = body.len()))]
pub fn handle(endpoint: Endpoint, body: &str) -> Response {
    match endpoint {
        Endpoint::MaxRegister => respond(body, max_register),
        Endpoint::RunProgram => respond(body, |request: &RunRequest| {
            run_program(request).map(Reply::Result)
        }),
    }
}

/// Deserializes `body`, runs `handler` and serializes its success value as
/// the whole reply. Errors become `{"error": "..."}`.
fn respond<Req, Res>(body: &str, handler: impl FnOnce(&Req) -> Result<Res, ServiceError>) -> Response
where
    Req: DeserializeOwned,
    Res: Serialize,
{
    let outcome = serde_json::from_str::<Req>(body)
        .map_err(ServiceError::from)
        .and_then(|request| handler(&request));

    match outcome {
        Ok(reply) => Response::new(Status::Ok, &reply),
        Err(err) => {
            warn!(%err, "request rejected");
            Response::new(Status::BadRequest, &Reply::<()>::Error(err.to_string()))
        }
    }
}
