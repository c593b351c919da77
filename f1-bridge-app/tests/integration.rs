#[cfg(test)]
mod integration_tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use serde_json::{json, Value};
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, BufReader};

    use f1_bridge_app::server;
    use f1_bridge_executor::PythonBridge;
    use f1_bridge_tools::{ToolDispatcher, ToolRegistry};

    /// Shell stand-in for the Python bridge: answers a couple of functions
    /// the way the real script does, envelope and all.
    fn stub_bridge(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("bridge.sh");
        std::fs::write(
            &path,
            r#"#!/bin/sh
fn="$1"; shift
case "$fn" in
  get_event_schedule)
    echo "{\"status\": \"success\", \"data\": [{\"EventName\": \"Bahrain Grand Prix\", \"Year\": $1}]}"
    ;;
  get_telemetry)
    echo "{\"status\": \"ok\", \"data\": {\"argc\": $#, \"last\": \"$4$5\"}}"
    ;;
  get_driver_info)
    echo "boom" >&2
    exit 1
    ;;
  get_session_results)
    echo "core dumped"
    ;;
  *)
    echo "{\"status\": \"error\", \"message\": \"Unknown function: $fn\"}"
    ;;
esac
"#,
        )
        .unwrap();
        path
    }

    async fn run_session(script: PathBuf, requests: &[String]) -> Vec<Value> {
        let bridge = PythonBridge::new("/bin/sh", script);
        let dispatcher = Arc::new(ToolDispatcher::new(ToolRegistry::new(), Arc::new(bridge)));

        let (client, server) = duplex(1 << 16);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let task = tokio::spawn(server::serve(
            dispatcher,
            BufReader::new(server_read),
            server_write,
        ));

        for request in requests {
            client_write.write_all(request.as_bytes()).await.unwrap();
            client_write.write_all(b"\n").await.unwrap();
        }
        client_write.shutdown().await.unwrap();

        let mut raw = String::new();
        client_read.read_to_string(&mut raw).await.unwrap();
        task.await.unwrap().unwrap();

        raw.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("valid JSON response"))
            .collect()
    }

    fn init_msg() -> String {
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1.0"}}}"#.to_string()
    }

    fn call_msg(id: u64, tool: &str, arguments: Value) -> String {
        format!(
            r#"{{"jsonrpc":"2.0","id":{id},"method":"tools/call","params":{{"name":"{tool}","arguments":{arguments}}}}}"#
        )
    }

    fn by_id(responses: &[Value], id: u64) -> &Value {
        responses
            .iter()
            .find(|r| r["id"] == json!(id))
            .unwrap_or_else(|| panic!("no response with id {id}"))
    }

    #[tokio::test]
    async fn test_full_session_against_stub_bridge() {
        let dir = tempfile::tempdir().unwrap();
        let script = stub_bridge(&dir);

        let responses = run_session(
            script,
            &[
                init_msg(),
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string(),
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}}"#.to_string(),
                call_msg(3, "get_event_schedule", json!({"year": 2024})),
            ],
        )
        .await;

        assert_eq!(by_id(&responses, 1)["result"]["serverInfo"]["name"], "f1-bridge");
        assert_eq!(
            by_id(&responses, 2)["result"]["tools"].as_array().unwrap().len(),
            8
        );

        let result = &by_id(&responses, 3)["result"];
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Bahrain Grand Prix"));
        // Content is the pretty-printed data, not the whole envelope.
        assert!(!text.contains("status"));
        assert_eq!(serde_json::from_str::<Value>(text).unwrap()[0]["Year"], 2024);
    }

    #[tokio::test]
    async fn test_telemetry_positional_args_through_real_process() {
        let dir = tempfile::tempdir().unwrap();
        let script = stub_bridge(&dir);

        let base = json!({
            "year": 2024,
            "event_identifier": "Monaco",
            "session_name": "Qualifying",
            "driver_identifier": "LEC",
        });
        let mut with_lap = base.clone();
        with_lap["lap_number"] = json!(12);

        let responses = run_session(
            script,
            &[
                init_msg(),
                call_msg(2, "get_telemetry", base),
                call_msg(3, "get_telemetry", with_lap),
            ],
        )
        .await;

        let data = |id: u64| -> Value {
            let text = by_id(&responses, id)["result"]["content"][0]["text"]
                .as_str()
                .unwrap()
                .to_string();
            serde_json::from_str(&text).unwrap()
        };

        assert_eq!(data(2)["argc"], 4);
        assert_eq!(data(2)["last"], "LEC");
        assert_eq!(data(3)["argc"], 5);
        assert_eq!(data(3)["last"], "LEC12");
    }

    #[tokio::test]
    async fn test_process_failure_text_contains_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = stub_bridge(&dir);

        let responses = run_session(
            script,
            &[
                init_msg(),
                call_msg(
                    2,
                    "get_driver_info",
                    json!({
                        "year": 2024,
                        "event_identifier": "Monaco",
                        "session_name": "Race",
                        "driver_identifier": "44",
                    }),
                ),
            ],
        )
        .await;

        let result = &by_id(&responses, 2)["result"];
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: "));
        assert!(text.contains("boom"));
    }

    #[tokio::test]
    async fn test_non_json_output_is_error_response_not_crash() {
        let dir = tempfile::tempdir().unwrap();
        let script = stub_bridge(&dir);

        let responses = run_session(
            script,
            &[
                init_msg(),
                call_msg(
                    2,
                    "get_session_results",
                    json!({
                        "year": 2024,
                        "event_identifier": "Monaco",
                        "session_name": "Race",
                    }),
                ),
                // The server must still answer after a malformed bridge reply.
                r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#.to_string(),
            ],
        )
        .await;

        let result = &by_id(&responses, 2)["result"];
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: "));
        assert!(text.contains("not a valid result envelope"));
        assert_eq!(by_id(&responses, 3)["result"], json!({}));
    }

    #[tokio::test]
    async fn test_upstream_error_text() {
        let dir = tempfile::tempdir().unwrap();
        let script = stub_bridge(&dir);

        let responses = run_session(
            script,
            &[
                init_msg(),
                call_msg(
                    2,
                    "compare_drivers",
                    json!({
                        "year": 2024,
                        "event_identifier": "Monaco",
                        "session_name": "Race",
                        "drivers": "VER,HAM",
                    }),
                ),
            ],
        )
        .await;

        let result = &by_id(&responses, 2)["result"];
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Error: Unknown function: compare_drivers"
        );
    }
}
