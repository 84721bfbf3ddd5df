use std::collections::HashSet;

use log::warn;
use serde::Deserialize;

use super::config::FALLBACK_START_ROOM;
use super::error::{MoveParseError, TraceError};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
	pub name: String,
	pub x: f64,
	pub y: f64,
	#[serde(default)]
	pub is_start: bool,
	#[serde(default)]
	pub is_end: bool,
	#[serde(default)]
	pub links: Vec<String>,
}

/// Wire shape served by the data endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TraceData {
	#[serde(default)]
	pub rooms: Vec<Room>,
	#[serde(default)]
	pub moves: Vec<String>,
}

pub fn parse_trace(json: &str) -> Result<TraceData, TraceError> {
	Ok(serde_json::from_str(json)?)
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
	pub rooms: Vec<Room>,
}

impl Graph {
	pub fn start_room(&self) -> &str {
		self.rooms
			.iter()
			.find(|r| r.is_start)
			.map(|r| r.name.as_str())
			.unwrap_or(FALLBACK_START_ROOM)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveCommand {
	pub token: String,
	pub destination: String,
}

impl MoveCommand {
	/// Splits `L1-room` at the first `-`.
	pub fn parse(raw: &str) -> Result<Self, MoveParseError> {
		let (token, destination) = raw
			.split_once('-')
			.ok_or_else(|| MoveParseError::MissingSeparator(raw.to_string()))?;
		if token.is_empty() {
			return Err(MoveParseError::EmptyToken(raw.to_string()));
		}
		if destination.is_empty() {
			return Err(MoveParseError::EmptyDestination(raw.to_string()));
		}
		Ok(Self {
			token: token.to_string(),
			destination: destination.to_string(),
		})
	}
}

pub type Step = Vec<MoveCommand>;

#[derive(Clone, Debug, Default)]
pub struct Trace {
	pub steps: Vec<Step>,
	/// Every token named in the first log line, in order, including tokens
	/// whose moves were dropped. All of them are placed at the start room.
	pub arrivals: Vec<String>,
}

impl Trace {
	pub fn len(&self) -> usize {
		self.steps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.steps.is_empty()
	}

	pub fn step(&self, index: usize) -> Option<&Step> {
		self.steps.get(index)
	}
}

/// Parses one log line. Malformed tokens are logged and skipped.
pub fn parse_step(line: &str) -> Step {
	line.split_whitespace()
		.filter_map(|raw| match MoveCommand::parse(raw) {
			Ok(cmd) => Some(cmd),
			Err(err) => {
				warn!("skipping move: {err}");
				None
			}
		})
		.collect()
}

/// Graph and trace decoded from one fetch, read-only from here on.
#[derive(Clone, Debug, Default)]
pub struct Replay {
	pub graph: Graph,
	pub trace: Trace,
}

impl Replay {
	pub fn from_data(data: TraceData) -> Self {
		let declared: HashSet<&str> = data.rooms.iter().map(|r| r.name.as_str()).collect();
		let parsed: Vec<Step> = data.moves.iter().map(|line| parse_step(line)).collect();

		let mut arrivals: Vec<String> = Vec::new();
		for cmd in parsed.first().into_iter().flatten() {
			if !arrivals.contains(&cmd.token) {
				arrivals.push(cmd.token.clone());
			}
		}

		let steps = parsed
			.into_iter()
			.map(|step| {
				step.into_iter()
					.filter(|cmd| {
						let known = declared.contains(cmd.destination.as_str());
						if !known {
							warn!(
								"skipping move {}-{}: undeclared room",
								cmd.token, cmd.destination
							);
						}
						known
					})
					.collect()
			})
			.collect();

		Self {
			trace: Trace { steps, arrivals },
			graph: Graph { rooms: data.rooms },
		}
	}
}
