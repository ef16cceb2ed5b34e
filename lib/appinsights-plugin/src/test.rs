#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use appinsights_sdk::{
        EventTelemetry, InMemoryTelemetryClient, TelemetryClient, TelemetryError,
    };
    use graphql_plugin_api::{
        background_tasks::BackgroundTasksManager,
        graphql_error::GraphQLError,
        hooks::server_will_start::{SchemaContext, ServerWillStartPayload},
        plugin_trait::GraphQLPluginBoxed,
        request_context::{
            GraphQLRequest, GraphQLRequestContext, HttpRequestInfo, OperationInfo, OperationKind,
        },
        schema::{Schema, ServerConfig},
        LifecycleDispatcher, PluginRegistry, PluginsConfig,
    };
    use serde_json::{json, Value};

    use crate::{AppInsightsPlugin, TelemetryClientSource};

    fn dispatcher(log_name: Option<&str>) -> (Arc<InMemoryTelemetryClient>, LifecycleDispatcher) {
        let client = Arc::new(InMemoryTelemetryClient::new());
        let plugin = AppInsightsPlugin::new(client.clone(), log_name.map(String::from))
            .expect("a provided client needs no connection string");
        let plugins: Vec<GraphQLPluginBoxed> = vec![Box::new(plugin)];
        (client, LifecycleDispatcher::new(plugins))
    }

    fn start_payload() -> ServerWillStartPayload {
        ServerWillStartPayload {
            config: ServerConfig::from_graph_ref("orders@prod"),
            schema: Schema::from("type Query { me: User }"),
            serverless_framework: false,
        }
    }

    fn request_context() -> GraphQLRequestContext {
        let headers = [("Content-Type", "application/json"), ("X-Req", "1")]
            .into_iter()
            .collect();
        let request = GraphQLRequest::new("query Me { me { name } }")
            .with_operation_name("Me")
            .with_http(HttpRequestInfo {
                method: "POST".into(),
                url: "/graphql".into(),
                headers,
            });
        GraphQLRequestContext::new(request)
    }

    fn request_id(event: &EventTelemetry) -> &str {
        event
            .properties
            .get("requestId")
            .and_then(Value::as_str)
            .expect("every record carries a requestId")
    }

    #[tokio::test]
    async fn server_records_share_the_start_request_id() {
        let (client, dispatcher) = dispatcher(Some("orders-api"));

        let listeners = dispatcher.server_will_start(&start_payload()).await.unwrap();
        listeners
            .schema_did_load_or_update(&SchemaContext {
                api_schema: Schema::from("type Query { me: User, you: User }"),
                core_supergraph_sdl: None,
            })
            .unwrap();
        listeners.drain_server().await.unwrap();
        listeners.server_will_stop().await.unwrap();

        let events = client.events();
        assert_eq!(
            client.event_names(),
            vec![
                "serviceWillStart",
                "schemaDidLoadOrUpdate",
                "drainServer",
                "serverWillStop"
            ]
        );

        let start = &events[0];
        assert!(!start.properties.contains_key("serverConfig"));
        assert_eq!(
            start.properties.get("apolloConfig"),
            Some(&json!({
                "graphId": "orders",
                "graphVariant": "prod",
                "graphRef": "orders@prod"
            }))
        );
        assert_eq!(
            start.properties.get("schema"),
            Some(&json!("type Query { me: User }"))
        );
        assert_eq!(
            start.properties.get("serverlessFramework"),
            Some(&json!(false))
        );
        assert_eq!(start.properties.get("logName"), Some(&json!("orders-api")));

        let id = request_id(start);
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert!(events.iter().all(|event| request_id(event) == id));
    }

    #[tokio::test]
    async fn every_server_start_gets_its_own_session() {
        let (client, dispatcher) = dispatcher(None);

        dispatcher.server_will_start(&start_payload()).await.unwrap();
        dispatcher.server_will_start(&start_payload()).await.unwrap();

        let events = client.events();
        assert_eq!(events.len(), 2);
        assert_ne!(request_id(&events[0]), request_id(&events[1]));
    }

    #[tokio::test]
    async fn schema_reload_emits_schema_request_id_and_log_name() {
        let (client, dispatcher) = dispatcher(Some("orders-api"));
        let listeners = dispatcher.server_will_start(&start_payload()).await.unwrap();

        listeners
            .schema_did_load_or_update(&SchemaContext {
                api_schema: Schema::from("type Query { a: String }"),
                core_supergraph_sdl: Some(
                    "schema { query: Query } type Query { a: String }".into(),
                ),
            })
            .unwrap();

        let events = client.events();
        let id = request_id(&events[0]).to_string();
        let reload = &events[1];
        assert_eq!(reload.name, "schemaDidLoadOrUpdate");
        assert_eq!(
            Value::Object(reload.properties.clone().into_inner()),
            json!({
                "schema": "type Query { a: String }",
                "requestId": id,
                "logName": "orders-api"
            })
        );
    }

    #[tokio::test]
    async fn log_name_is_left_out_when_not_configured() {
        let (client, dispatcher) = dispatcher(None);

        let listeners = dispatcher.server_will_start(&start_payload()).await.unwrap();
        listeners.drain_server().await.unwrap();

        for event in client.events() {
            assert!(!event.properties.contains_key("logName"));
        }
    }

    #[tokio::test]
    async fn request_records_share_the_request_did_start_id() {
        let (client, dispatcher) = dispatcher(Some("orders-api"));
        let mut context = request_context();

        let listeners = dispatcher.request_did_start(&context).await.unwrap();
        assert!(context.resolve_source());
        listeners.did_resolve_source(&context).await.unwrap();
        listeners.parsing_did_start(&context).await.unwrap();
        listeners.validation_did_start(&context).await.unwrap();
        context.resolve_operation(OperationInfo {
            kind: OperationKind::Query,
            name: Some("Me".into()),
        });
        listeners.did_resolve_operation(&context).await.unwrap();
        context
            .errors
            .push(GraphQLError::from("Cannot query field \"name\" on type \"User\"."));
        listeners.did_encounter_errors(&context).await.unwrap();

        let events = client.events();
        assert_eq!(
            client.event_names(),
            vec![
                "requestDidStart",
                "didResolveSource",
                "parsingDidStart",
                "validationDidStart",
                "didResolveOperation"
            ]
        );

        let started = &events[0];
        let id = request_id(started);
        assert!(events.iter().all(|event| request_id(event) == id));

        let exceptions = client.exceptions();
        assert_eq!(exceptions.len(), 1);
        assert_eq!(
            exceptions[0].properties.get("requestId").and_then(Value::as_str),
            Some(id)
        );
        assert_eq!(
            exceptions[0].properties.get("logName"),
            Some(&json!("orders-api"))
        );

        assert_eq!(
            started.properties.get("headers"),
            Some(&json!({ "Content-Type": "application/json", "X-Req": "1" }))
        );
        assert_eq!(started.properties.get("isDebug"), Some(&json!(false)));
        assert_eq!(started.properties.get("operationName"), Some(&json!("Me")));
        assert_eq!(started.properties.get("operation"), Some(&Value::Null));
        assert_eq!(started.properties.get("metrics"), Some(&json!({})));
        assert_eq!(
            started.properties.get("request").and_then(|r| r.get("query")),
            Some(&json!("query Me { me { name } }"))
        );

        let source = &events[1];
        assert_eq!(
            source.properties.get("source"),
            Some(&json!("query Me { me { name } }"))
        );
        assert_eq!(
            source.properties.get("queryHash"),
            context.query_hash.as_ref().map(|hash| json!(hash)).as_ref()
        );
        assert!(source.properties.contains_key("metrics"));

        let resolved = &events[4];
        assert_eq!(
            resolved.properties.get("operation"),
            Some(&json!({ "kind": "query", "name": "Me" }))
        );
    }

    #[tokio::test]
    async fn concurrent_requests_get_distinct_ids() {
        let (client, dispatcher) = dispatcher(None);
        let first = request_context();
        let second = request_context();

        let (a, b) = tokio::join!(
            dispatcher.request_did_start(&first),
            dispatcher.request_did_start(&second)
        );
        a.unwrap();
        b.unwrap();

        let events = client.events();
        assert_eq!(events.len(), 2);
        let ids: Vec<uuid::Uuid> = events
            .iter()
            .map(|event| uuid::Uuid::parse_str(request_id(event)).unwrap())
            .collect();
        assert_ne!(ids[0], ids[1]);
        assert!(ids
            .iter()
            .all(|id| id.get_version() == Some(uuid::Version::Random)));
    }

    #[tokio::test]
    async fn forwards_each_error_value_not_its_index() {
        let (client, dispatcher) = dispatcher(None);
        let mut context = request_context();
        let listeners = dispatcher.request_did_start(&context).await.unwrap();

        context.errors = vec![
            GraphQLError::from("Syntax Error: Unexpected Name \"qury\".").with_location(1, 1),
            GraphQLError::from("Not authorized").with_path(vec!["me".into(), 0usize.into()]),
        ];
        listeners.did_encounter_errors(&context).await.unwrap();

        let exceptions = client.exceptions();
        let messages: Vec<&str> = exceptions
            .iter()
            .filter_map(|exception| exception.exception())
            .map(|details| details.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["Syntax Error: Unexpected Name \"qury\".", "Not authorized"]
        );
        assert!(exceptions
            .iter()
            .filter_map(|exception| exception.exception())
            .all(|details| details.type_name == "GraphQLError"));
        assert_eq!(
            exceptions[0].properties.get("locations"),
            Some(&json!([{ "line": 1, "column": 1 }]))
        );
        assert_eq!(exceptions[1].properties.get("path"), Some(&json!(["me", 0])));
        assert!(client.events().iter().all(|e| e.name == "requestDidStart"));
    }

    #[tokio::test]
    async fn failing_client_error_reaches_the_caller() {
        let client = Arc::new(InMemoryTelemetryClient::failing("ingestion offline"));
        let plugin = AppInsightsPlugin::new(client, None).unwrap();
        let plugins: Vec<GraphQLPluginBoxed> = vec![Box::new(plugin)];
        let dispatcher = LifecycleDispatcher::new(plugins);

        let err = dispatcher
            .server_will_start(&start_payload())
            .await
            .err()
            .expect("server start should fail");
        assert!(matches!(
            err.downcast_ref::<TelemetryError>(),
            Some(TelemetryError::Unknown(message)) if message == "ingestion offline"
        ));

        let err = dispatcher
            .request_did_start(&request_context())
            .await
            .err()
            .expect("request start should fail");
        assert_eq!(err.to_string(), "unable to send telemetry: ingestion offline");
    }

    #[tokio::test]
    async fn client_failing_after_start_fails_server_will_stop() {
        let (client, dispatcher) = dispatcher(None);
        let listeners = dispatcher.server_will_start(&start_payload()).await.unwrap();

        client.fail_with("ingestion offline");

        let err = listeners
            .server_will_stop()
            .await
            .expect_err("server stop should fail");
        assert_eq!(err.to_string(), "unable to send telemetry: ingestion offline");
        assert_eq!(client.event_names(), vec!["serviceWillStart"]);
    }

    #[tokio::test]
    async fn client_failing_after_start_fails_did_encounter_errors() {
        let (client, dispatcher) = dispatcher(None);
        let mut context = request_context();
        let listeners = dispatcher.request_did_start(&context).await.unwrap();

        client.fail_with("ingestion offline");
        context.errors.push(GraphQLError::from("Not authorized"));

        let err = listeners
            .did_encounter_errors(&context)
            .await
            .expect_err("error forwarding should fail");
        assert!(matches!(
            err.downcast_ref::<TelemetryError>(),
            Some(TelemetryError::Unknown(message)) if message == "ingestion offline"
        ));
        assert!(client.exceptions().is_empty());
    }

    #[test]
    fn provided_client_is_used_as_is() {
        let client: Arc<dyn TelemetryClient> = Arc::new(InMemoryTelemetryClient::new());

        let plugin = AppInsightsPlugin::with_client(client.clone(), None);

        match plugin.client_source() {
            TelemetryClientSource::Provided(provided) => assert!(Arc::ptr_eq(provided, &client)),
            TelemetryClientSource::Owned(_) => panic!("no client should be built"),
        }
    }

    #[test]
    fn connection_string_builds_one_owned_client() {
        let plugin = AppInsightsPlugin::from_connection_string(
            "InstrumentationKey=0000-1111;IngestionEndpoint=https://westeurope-5.in.applicationinsights.azure.com/",
            Some("orders-api".into()),
        )
        .unwrap();

        match plugin.client_source() {
            TelemetryClientSource::Owned(client) => {
                assert_eq!(client.instrumentation_key(), "0000-1111");
                assert_eq!(
                    client.endpoint(),
                    "https://westeurope-5.in.applicationinsights.azure.com/v2.1/track"
                );
            }
            TelemetryClientSource::Provided(_) => panic!("expected an owned client"),
        }
        assert_eq!(plugin.log_name(), Some("orders-api"));
    }

    #[test]
    fn connection_string_without_key_is_rejected() {
        assert!(matches!(
            AppInsightsPlugin::new("IngestionEndpoint=https://example.com", None),
            Err(TelemetryError::MissingInstrumentationKey)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn registry_initialized_plugin_ships_telemetry_on_shutdown() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2.1/track")
            .match_request(|request| {
                let body: Value =
                    serde_json::from_slice(request.body().expect("Failed to extract body"))
                        .expect("Failed to parse request body as JSON");
                let items = body.as_array().expect("batch should be an array");
                items.len() == 2
                    && items
                        .iter()
                        .all(|item| item["data"]["baseData"]["properties"]["logName"] == "orders-api")
            })
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let plugins_config: PluginsConfig = serde_json::from_value(json!({
            "appinsights": {
                "config": {
                    "connection_string": format!("InstrumentationKey=test-key;IngestionEndpoint={}", server.url()),
                    "log_name": "orders-api",
                    "flush_interval": "1h",
                    "max_retries": 0
                }
            }
        }))
        .unwrap();
        let mut bg_tasks = BackgroundTasksManager::new();

        let plugins = PluginRegistry::new()
            .register::<AppInsightsPlugin>()
            .initialize_plugins(&plugins_config, &mut bg_tasks)
            .unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(bg_tasks.len(), 1);

        let dispatcher = LifecycleDispatcher::new(plugins);
        let listeners = dispatcher.server_will_start(&start_payload()).await.unwrap();
        listeners.server_will_stop().await.unwrap();

        dispatcher.shutdown().await;
        bg_tasks.shutdown().await;

        mock.assert_async().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn constructed_plugin_ships_a_full_buffer_without_a_flush_task() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2.1/track")
            .match_request(|request| {
                let body: Value =
                    serde_json::from_slice(request.body().expect("Failed to extract body"))
                        .expect("Failed to parse request body as JSON");
                body.as_array().map(Vec::len) == Some(250)
            })
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let plugin = AppInsightsPlugin::new(
            format!("InstrumentationKey=test-key;IngestionEndpoint={}", server.url()),
            None,
        )
        .unwrap();
        let TelemetryClientSource::Owned(client) = plugin.client_source() else {
            panic!("expected an owned client");
        };
        let client = client.clone();
        let plugins: Vec<GraphQLPluginBoxed> = vec![Box::new(plugin)];
        let dispatcher = LifecycleDispatcher::new(plugins);

        let context = request_context();
        for _ in 0..260 {
            dispatcher.request_did_start(&context).await.unwrap();
        }
        assert_eq!(client.pending().unwrap(), 10);

        for _ in 0..100 {
            if mock.matched_async().await {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_plugin_config_fails_initialization() {
        let plugins_config: PluginsConfig = serde_json::from_value(json!({
            "appinsights": { "config": { "flush_interval": "soon" } }
        }))
        .unwrap();

        let result = PluginRegistry::new()
            .register::<AppInsightsPlugin>()
            .initialize_plugins(&plugins_config, &mut BackgroundTasksManager::new());

        assert!(result.is_err());
    }
}
