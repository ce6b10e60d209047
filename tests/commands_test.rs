// ==========================================
// JSON 命令层测试
// ==========================================
// 职责: 验证命令返回的 JSON 结构与错误响应格式
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod commands_test {
    use bom_packaging::app::{commands, AppState, ErrorResponse};
    use bom_packaging::config::config_keys;
    use bom_packaging::db::CURRENT_SCHEMA_VERSION;
    use bom_packaging::domain::ShippingInfo;
    use serde_json::Value;

    use crate::test_helpers::{
        create_test_db, create_test_state, ids, open_raw_conn, seed_drawing, seed_standard_project,
    };

    fn parse_error(raw: &str) -> ErrorResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_allocate_and_compose_commands() {
        let (_tmp, state) = create_test_state();
        seed_standard_project(&state.catalog_repo);

        let json = commands::allocate_packaging_units(&state, "PJ1").unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["selected_count"], 2);
        assert_eq!(value["inserted_count"], 2);

        let json =
            commands::compose_packaging_list(&state, ids(&["KT-D1-P2", "KT-D1-P1"]), "PJ1", None)
                .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["list_id"], "KL-D1-P1");
        assert_eq!(value["updated_count"], 2);
    }

    #[test]
    fn test_error_json_shape() {
        let (_tmp, state) = create_test_state();

        let err = commands::get_flat_view(&state, "PJ404").unwrap_err();
        let parsed = parse_error(&err);
        assert_eq!(parsed.code, "NOT_FOUND");
        assert!(parsed.message.contains("PJ404"));

        let err = commands::compose_packaging_list(&state, Vec::new(), "PJ1", None).unwrap_err();
        assert_eq!(parse_error(&err).code, "INVALID_ARGUMENT");
    }

    #[test]
    fn test_conflict_error_code() {
        let (_tmp, state) = create_test_state();
        seed_standard_project(&state.catalog_repo);
        commands::allocate_packaging_units(&state, "PJ1").unwrap();
        commands::compose_packaging_list(&state, ids(&["KT-D1-P1"]), "PJ1", None).unwrap();

        let err = commands::compose_packaging_list(&state, ids(&["KT-D1-P1"]), "PJ1", None)
            .unwrap_err();
        assert_eq!(parse_error(&err).code, "CONFLICT");
    }

    #[test]
    fn test_view_and_listing_commands() {
        let (_tmp, state) = create_test_state();
        seed_standard_project(&state.catalog_repo);
        commands::allocate_packaging_units(&state, "PJ1").unwrap();
        commands::compose_packaging_list(&state, ids(&["KT-D1-P1"]), "PJ1", None).unwrap();

        let nested: Value =
            serde_json::from_str(&commands::get_nested_view(&state, "PJ1").unwrap()).unwrap();
        assert_eq!(nested[0]["units"][0]["part"]["materials"].as_array().unwrap().len(), 2);

        let unassigned: Value =
            serde_json::from_str(&commands::list_unassigned_units(&state, "PJ1").unwrap()).unwrap();
        assert_eq!(unassigned[0]["unit_id"], "KT-D1-P2");

        let lists: Value =
            serde_json::from_str(&commands::list_packaging_lists(&state, "PJ1").unwrap()).unwrap();
        assert_eq!(lists[0]["list_id"], "KL-D1-P1");
        assert_eq!(lists[0]["unit_count"], 1);

        let logs: Value =
            serde_json::from_str(&commands::list_action_logs(&state, "PJ1", 5).unwrap()).unwrap();
        assert_eq!(logs[0]["action_type"], "COMPOSE_LIST");
    }

    #[test]
    fn test_shipping_and_config_commands() {
        let (_tmp, state) = create_test_state();
        seed_standard_project(&state.catalog_repo);
        commands::allocate_packaging_units(&state, "PJ1").unwrap();

        commands::set_config_value(&state, config_keys::DEFAULT_SHIP_FROM, "本社工場").unwrap();
        commands::compose_packaging_list(&state, ids(&["KT-D1-P1"]), "PJ1", None).unwrap();

        let json = commands::update_list_shipping(
            &state,
            "KL-D1-P1",
            ShippingInfo {
                ship_from: None,
                ship_to: Some("現場".to_string()),
                image_id: None,
            },
        )
        .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ship_to"], "現場");
        assert_eq!(value["ship_from"], Value::Null);

        let err = commands::set_config_value(&state, " ", "x").unwrap_err();
        assert_eq!(parse_error(&err).code, "INVALID_ARGUMENT");
    }

    #[test]
    fn test_list_drawings_command() {
        let (_tmp, state) = create_test_state();
        seed_standard_project(&state.catalog_repo);
        seed_drawing(&state.catalog_repo, "PJ1", "A1");
        seed_drawing(&state.catalog_repo, "PJ2", "D9");

        let drawings: Value =
            serde_json::from_str(&commands::list_drawings(&state, "PJ1").unwrap()).unwrap();
        let ids: Vec<&str> = drawings
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["drawing_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["A1", "D1"]);

        let err = commands::list_drawings(&state, "PJ404").unwrap_err();
        assert_eq!(parse_error(&err).code, "NOT_FOUND");
    }

    #[test]
    fn test_list_config_values_command() {
        let (_tmp, state) = create_test_state();
        commands::set_config_value(&state, config_keys::DEFAULT_SHIP_TO, "現場").unwrap();
        commands::set_config_value(&state, config_keys::DEFAULT_SHIP_FROM, "本社工場").unwrap();

        let values: Value =
            serde_json::from_str(&commands::list_config_values(&state).unwrap()).unwrap();
        assert_eq!(values[config_keys::DEFAULT_SHIP_FROM], "本社工場");
        assert_eq!(values[config_keys::DEFAULT_SHIP_TO], "現場");
    }

    #[test]
    fn test_state_reports_schema_version() {
        let (_tmp, state) = create_test_state();
        assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_state_rejects_newer_schema() {
        bom_packaging::logging::init_test();
        let (_tmp, db_path) = create_test_db().unwrap();
        open_raw_conn(&db_path)
            .execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION + 1],
            )
            .unwrap();

        let err = AppState::new(db_path).err().unwrap();
        assert!(err.contains("schema"));
    }
}
