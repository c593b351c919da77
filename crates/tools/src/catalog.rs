use serde_json::{json, Map, Value};

use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

/// One entry of the tool catalog. The tool name doubles as the function
/// name passed to the bridge process, and `params` is the exact positional
/// order that process expects.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolSpec {
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.params {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::from(param.name));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Build the positional argument list for the bridge process.
    ///
    /// Parameters are walked in declared order. An absent optional parameter
    /// is skipped outright, never passed as an empty placeholder, so it
    /// cannot shift the position of anything after it.
    pub fn marshal_args(&self, arguments: &Value) -> Result<Vec<String>, ToolError> {
        let mut argv = Vec::with_capacity(self.params.len());
        for param in self.params {
            match arguments.get(param.name) {
                Some(value) if !value.is_null() => argv.push(param.stringify(value)?),
                _ if param.required => {
                    return Err(ToolError::MissingArgument {
                        tool: self.name,
                        param: param.name,
                    })
                }
                _ => {}
            }
        }
        Ok(argv)
    }
}

impl ParamSpec {
    fn stringify(&self, value: &Value) -> Result<String, ToolError> {
        match (self.kind, value) {
            (ParamKind::Number, Value::Number(n)) => Ok(match n.as_i64() {
                // Integral values must not pick up a fractional part: the
                // bridge runs them through int().
                Some(i) => i.to_string(),
                None => n.to_string(),
            }),
            (ParamKind::Number, Value::String(s)) if s.trim().parse::<f64>().is_ok() => {
                Ok(s.trim().to_string())
            }
            (ParamKind::String, Value::String(s)) => Ok(s.clone()),
            (ParamKind::String, Value::Number(n)) => Ok(n.to_string()),
            _ => Err(ToolError::InvalidArgument {
                param: self.name,
                reason: format!("expected {}, got {}", self.kind.json_type(), value),
            }),
        }
    }
}

const YEAR: ParamSpec = ParamSpec {
    name: "year",
    kind: ParamKind::Number,
    required: true,
    description: "Championship season, e.g. 2024",
};

const EVENT_IDENTIFIER: ParamSpec = ParamSpec {
    name: "event_identifier",
    kind: ParamKind::String,
    required: true,
    description: "Event name or round number, e.g. 'Monaco' or '7'",
};

const SESSION_NAME: ParamSpec = ParamSpec {
    name: "session_name",
    kind: ParamKind::String,
    required: true,
    description: "Session name, e.g. 'Race', 'Qualifying', 'FP1'",
};

const DRIVER_IDENTIFIER: ParamSpec = ParamSpec {
    name: "driver_identifier",
    kind: ParamKind::String,
    required: true,
    description: "Driver number, three-letter code or name, e.g. '44' or 'HAM'",
};

/// The fixed tool catalog. Built once, never mutated at runtime.
pub const CATALOG: &[ToolSpec] = &[
    ToolSpec {
        name: "get_event_schedule",
        description: "Get the full race calendar for a Formula One season",
        params: &[YEAR],
    },
    ToolSpec {
        name: "get_event_info",
        description: "Get details of a specific Grand Prix weekend",
        params: &[
            YEAR,
            ParamSpec {
                name: "identifier",
                kind: ParamKind::String,
                required: true,
                description: "Event name or round number, e.g. 'Monaco' or '7'",
            },
        ],
    },
    ToolSpec {
        name: "get_session_results",
        description: "Get the classified results for a session of an event",
        params: &[YEAR, EVENT_IDENTIFIER, SESSION_NAME],
    },
    ToolSpec {
        name: "get_driver_info",
        description: "Get entry details for one driver in a session",
        params: &[YEAR, EVENT_IDENTIFIER, SESSION_NAME, DRIVER_IDENTIFIER],
    },
    ToolSpec {
        name: "analyze_driver_performance",
        description: "Analyze a driver's lap-by-lap pace in a session",
        params: &[YEAR, EVENT_IDENTIFIER, SESSION_NAME, DRIVER_IDENTIFIER],
    },
    ToolSpec {
        name: "compare_drivers",
        description: "Compare lap statistics between multiple drivers in a session",
        params: &[
            YEAR,
            EVENT_IDENTIFIER,
            SESSION_NAME,
            ParamSpec {
                name: "drivers",
                kind: ParamKind::String,
                required: true,
                description: "Comma-separated driver codes, e.g. 'VER,HAM,LEC'",
            },
        ],
    },
    ToolSpec {
        name: "get_telemetry",
        description: "Get car telemetry for a specific lap, or the fastest lap when none is given",
        params: &[
            YEAR,
            EVENT_IDENTIFIER,
            SESSION_NAME,
            DRIVER_IDENTIFIER,
            ParamSpec {
                name: "lap_number",
                kind: ParamKind::Number,
                required: false,
                description: "Lap to inspect; defaults to the driver's fastest lap",
            },
        ],
    },
    ToolSpec {
        name: "get_championship_standings",
        description: "Get drivers' and constructors' championship standings",
        params: &[
            YEAR,
            ParamSpec {
                name: "round_num",
                kind: ParamKind::Number,
                required: false,
                description: "Standings after this round; defaults to the latest",
            },
        ],
    },
];
