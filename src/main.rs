// ==========================================
// BOM 包装管理系统 - 命令行入口
// ==========================================
// 用法: bom-packaging <command> [args...]
// 输出: 成功时结果 JSON 写 stdout；失败时错误 JSON 写 stderr，退出码 1
// ==========================================

use std::process::ExitCode;

use bom_packaging::app::{commands, map_api_error, AppState};
use bom_packaging::config::AppConfig;
use bom_packaging::domain::{Drawing, DrawingKind, Material, Part, ShippingInfo};
use bom_packaging::{logging, ApiError};

const USAGE: &str = "用法: bom-packaging <command> [args...]

commands:
  init                                  初始化数据库
  seed-demo <project>                   写入演示图纸/部品/部材
  drawings <project>                    项目图纸一览
  allocate <project>                    生成包装单元
  compose <project> <unit>...           组成包装清单
  flat <project>                        扁平视图
  nested <project>                      嵌套视图
  unassigned <project>                  未归属清单的包装单元
  lists <project>                       包装清单摘要
  export-csv <project>                  扁平视图导出为 CSV（stdout）
  logs <project> [limit]                最近操作日志（默认 20）
  ship <list> <from> <to> [image]       更新清单发货信息
  config-set <key> <value>              写入全局业务配置
  config-list                           全局业务配置一览";

const DEFAULT_LOG_LIMIT: usize = 20;

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    };

    let config = AppConfig::from_env();
    tracing::debug!("系统版本: {}，数据库: {}", bom_packaging::VERSION, config.db_path);

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", map_api_error(ApiError::StoreUnavailable(e)));
            return ExitCode::FAILURE;
        }
    };

    match run(&state, command, rest) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(state: &AppState, command: &str, args: &[String]) -> Result<String, String> {
    match command {
        "init" => Ok(serde_json::json!({
            "db_path": state.db_path,
            "schema_version": state.schema_version,
        })
        .to_string()),
        "drawings" => commands::list_drawings(state, arg(args, 0, "project")?),
        "seed-demo" => seed_demo(state, arg(args, 0, "project")?),
        "allocate" => commands::allocate_packaging_units(state, arg(args, 0, "project")?),
        "compose" => {
            let project_id = arg(args, 0, "project")?;
            commands::compose_packaging_list(state, args[1..].to_vec(), project_id, None)
        }
        "flat" => commands::get_flat_view(state, arg(args, 0, "project")?),
        "nested" => commands::get_nested_view(state, arg(args, 0, "project")?),
        "unassigned" => commands::list_unassigned_units(state, arg(args, 0, "project")?),
        "lists" => commands::list_packaging_lists(state, arg(args, 0, "project")?),
        "export-csv" => {
            let project_id = arg(args, 0, "project")?;
            let mut buf = Vec::new();
            state
                .packaging_api
                .export_flat_view_csv(project_id, &mut buf)
                .map_err(map_api_error)?;
            String::from_utf8(buf)
                .map(|s| s.trim_end().to_string())
                .map_err(|e| map_api_error(ApiError::Internal(e.to_string())))
        }
        "logs" => {
            let project_id = arg(args, 0, "project")?;
            let limit = match args.get(1) {
                Some(raw) => raw.parse::<usize>().map_err(|_| {
                    map_api_error(ApiError::InvalidArgument(format!("limit 非法: {}", raw)))
                })?,
                None => DEFAULT_LOG_LIMIT,
            };
            commands::list_action_logs(state, project_id, limit)
        }
        "ship" => {
            let list_id = arg(args, 0, "list")?;
            let shipping = ShippingInfo {
                ship_from: Some(arg(args, 1, "from")?.to_string()),
                ship_to: Some(arg(args, 2, "to")?.to_string()),
                image_id: args.get(3).cloned(),
            };
            commands::update_list_shipping(state, list_id, shipping)
        }
        "config-set" => commands::set_config_value(
            state,
            arg(args, 0, "key")?,
            arg(args, 1, "value")?,
        ),
        "config-list" => commands::list_config_values(state),
        other => Err(map_api_error(ApiError::InvalidArgument(format!(
            "未知命令: {}\n{}",
            other, USAGE
        )))),
    }
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str, String> {
    args.get(index)
        .map(|s| s.as_str())
        .ok_or_else(|| map_api_error(ApiError::InvalidArgument(format!("缺少参数 <{}>", name))))
}

/// 演示数据：一张组立图、两张详细图、四个部品
fn seed_demo(state: &AppState, project_id: &str) -> Result<String, String> {
    let repo = &state.catalog_repo;
    let assembly_id = format!("{}-A01", project_id);

    let drawings = [
        (assembly_id.clone(), "架台組立", DrawingKind::Assembly, None),
        (
            format!("{}-D01", project_id),
            "架台脚",
            DrawingKind::Detail,
            Some(assembly_id.clone()),
        ),
        (
            format!("{}-D02", project_id),
            "天板",
            DrawingKind::Detail,
            Some(assembly_id.clone()),
        ),
    ];

    let mut parts = 0usize;
    let mut materials = 0usize;
    for (drawing_id, name, kind, parent) in drawings {
        repo.insert_drawing(&Drawing {
            drawing_id: drawing_id.clone(),
            project_id: project_id.to_string(),
            drawing_name: name.to_string(),
            drawing_kind: kind,
            assembly_drawing_id: parent,
        })
        .map_err(|e| map_api_error(e.into()))?;

        if kind != DrawingKind::Detail {
            continue;
        }

        for (part_id, quantity) in [("P01", 4.0), ("P02", 2.5)] {
            repo.insert_part(&Part {
                drawing_id: drawing_id.clone(),
                part_id: part_id.to_string(),
                part_name: format!("{} {}", name, part_id),
                quantity,
                spare_quantity: 0.0,
                manufacturer: "社内".to_string(),
            })
            .map_err(|e| map_api_error(e.into()))?;
            parts += 1;

            for (material_id, weight) in [("M01", 1.25), ("M02", 0.5)] {
                repo.insert_material(&Material {
                    drawing_id: drawing_id.clone(),
                    part_id: part_id.to_string(),
                    material_id: material_id.to_string(),
                    material_name: format!("SS400 {}", material_id),
                    weight,
                    quantity: 1.0,
                    material_type: "鋼板".to_string(),
                })
                .map_err(|e| map_api_error(e.into()))?;
                materials += 1;
            }
        }
    }

    Ok(serde_json::json!({
        "project_id": project_id,
        "drawings": 3,
        "parts": parts,
        "materials": materials,
    })
    .to_string())
}
