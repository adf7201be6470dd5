// ==========================================
// 销售导入门户 - 命令行入口
// ==========================================
// 用法:
//   sales-ingest validate <type> <file>
//   sales-ingest upload <type> <year> <month> <file> [--replace] [--rows 2,3,...]
//   sales-ingest sales <item_id> [start end] [--restaurant NAME]
//   sales-ingest reset <item_id>
//   sales-ingest months <type> <year>
//   sales-ingest restaurants
//   sales-ingest import-catalog <items.json>
//   sales-ingest catalog | codes | match-codes
//   sales-ingest set-code <item_id> <variation_index> <code>
//   sales-ingest set-short-code <item_id> <code>
//   sales-ingest set-codes <mappings.json>
// 输出: JSON 写 stdout；日志写 stderr
// ==========================================

use sales_ingest::api::{AggregateRequest, ApiError, ApiResult, SetCodeRequest};
use sales_ingest::app::{get_default_db_path, AppState};
use serde::Serialize;
use std::process::ExitCode;

const USAGE: &str = "\
usage:
  sales-ingest validate <type> <file>
  sales-ingest upload <type> <year> <month> <file> [--replace] [--rows 2,3,...]
  sales-ingest sales <item_id> [start end] [--restaurant NAME]
  sales-ingest reset <item_id>
  sales-ingest months <type> <year>
  sales-ingest restaurants
  sales-ingest import-catalog <items.json>
  sales-ingest catalog
  sales-ingest codes
  sales-ingest match-codes
  sales-ingest set-code <item_id> <variation_index> <code>
  sales-ingest set-short-code <item_id> <code>
  sales-ingest set-codes <mappings.json>";

#[derive(Debug, PartialEq)]
enum Command {
    Validate {
        upload_type: String,
        file: String,
    },
    Upload {
        upload_type: String,
        year: i32,
        month: u32,
        file: String,
        replace: bool,
        rows: Option<Vec<usize>>,
    },
    Sales(SalesArgs),
    Reset {
        item_id: String,
    },
    Months {
        upload_type: String,
        year: i32,
    },
    Restaurants,
    ImportCatalog {
        file: String,
    },
    Catalog,
    Codes,
    MatchCodes,
    SetCode(SetCodeRequest),
    SetCodes {
        file: String,
    },
}

#[derive(Debug, PartialEq)]
struct SalesArgs {
    item_id: String,
    start_date: Option<String>,
    end_date: Option<String>,
    restaurant: Option<String>,
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| format!("invalid {}: {}", name, raw))
}

fn parse_rows(raw: &str) -> Result<Vec<usize>, String> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_number::<usize>("row", s))
        .collect()
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let (name, rest) = args.split_first().ok_or("missing command")?;

    // 分离位置参数与选项
    let mut positional: Vec<&str> = Vec::new();
    let mut replace = false;
    let mut rows = None;
    let mut restaurant = None;
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--replace" => replace = true,
            "--rows" => {
                let value = iter.next().ok_or("--rows needs a value")?;
                rows = Some(parse_rows(value)?);
            }
            "--restaurant" => {
                let value = iter.next().ok_or("--restaurant needs a value")?;
                restaurant = Some(value.clone());
            }
            other if other.starts_with("--") => return Err(format!("unknown option: {}", other)),
            other => positional.push(other),
        }
    }

    let command = match (name.as_str(), positional.as_slice()) {
        ("validate", [upload_type, file]) => Command::Validate {
            upload_type: upload_type.to_string(),
            file: file.to_string(),
        },
        ("upload", [upload_type, year, month, file]) => Command::Upload {
            upload_type: upload_type.to_string(),
            year: parse_number("year", year)?,
            month: parse_number("month", month)?,
            file: file.to_string(),
            replace,
            rows,
        },
        ("sales", [item_id]) => Command::Sales(SalesArgs {
            item_id: item_id.to_string(),
            start_date: None,
            end_date: None,
            restaurant,
        }),
        ("sales", [item_id, start, end]) => Command::Sales(SalesArgs {
            item_id: item_id.to_string(),
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            restaurant,
        }),
        ("reset", [item_id]) => Command::Reset {
            item_id: item_id.to_string(),
        },
        ("months", [upload_type, year]) => Command::Months {
            upload_type: upload_type.to_string(),
            year: parse_number("year", year)?,
        },
        ("restaurants", []) => Command::Restaurants,
        ("import-catalog", [file]) => Command::ImportCatalog {
            file: file.to_string(),
        },
        ("catalog", []) => Command::Catalog,
        ("codes", []) => Command::Codes,
        ("match-codes", []) => Command::MatchCodes,
        ("set-code", [item_id, variation_index, code]) => Command::SetCode(SetCodeRequest {
            item_id: item_id.to_string(),
            variation_index: Some(parse_number("variation_index", variation_index)?),
            code: code.to_string(),
        }),
        ("set-short-code", [item_id, code]) => Command::SetCode(SetCodeRequest {
            item_id: item_id.to_string(),
            variation_index: None,
            code: code.to_string(),
        }),
        ("set-codes", [file]) => Command::SetCodes {
            file: file.to_string(),
        },
        (other, _) => return Err(format!("unknown command or wrong arguments: {}", other)),
    };
    Ok(command)
}

fn print_json<T: Serialize>(value: &T) -> ApiResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InternalError(format!("JSON 序列化失败: {}", e)))?;
    println!("{}", text);
    Ok(())
}

async fn run(state: &AppState, command: Command) -> ApiResult<()> {
    match command {
        Command::Validate { upload_type, file } => {
            let report = state.upload_api.pre_validate_file(&file, &upload_type).await?;
            print_json(&report)
        }
        Command::Upload {
            upload_type,
            year,
            month,
            file,
            replace,
            rows,
        } => {
            let response = state
                .upload_api
                .upload_file(&file, &upload_type, year, month, replace, rows)
                .await?;
            print_json(&response)
        }
        Command::Sales(args) => {
            let view = state
                .sales_api
                .aggregate(AggregateRequest {
                    item_id: args.item_id,
                    start_date: args.start_date,
                    end_date: args.end_date,
                    restaurant: args.restaurant,
                })
                .await?;
            print_json(&view)
        }
        Command::Reset { item_id } => {
            let response = state.sales_api.reset_sales_history(&item_id).await?;
            print_json(&response)
        }
        Command::Months { upload_type, year } => {
            let statuses = state.upload_api.month_statuses(&upload_type, year).await?;
            print_json(&statuses)
        }
        Command::Restaurants => {
            let names = state.sales_api.list_restaurants().await?;
            print_json(&names)
        }
        Command::ImportCatalog { file } => {
            let response = state.catalog_api.import_catalog(&file).await?;
            print_json(&response)
        }
        Command::Catalog => print_json(&state.catalog_api.catalog_codes().await?),
        Command::Codes => print_json(&state.catalog_api.uploaded_codes().await?),
        Command::MatchCodes => print_json(&state.catalog_api.match_codes().await?),
        Command::SetCode(request) => print_json(&state.catalog_api.set_code(request).await?),
        Command::SetCodes { file } => {
            let response = state.catalog_api.set_codes_from_file(&file).await?;
            print_json(&response)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    sales_ingest::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_command(&args) {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };

    let db_path = get_default_db_path();
    tracing::info!(version = sales_ingest::VERSION, db_path = %db_path, "{}", sales_ingest::APP_NAME);

    let state = match AppState::initialize(db_path).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e);
            return ExitCode::FAILURE;
        }
    };

    match state.config.get_locale().await {
        Ok(locale) => sales_ingest::i18n::set_locale(&locale),
        Err(e) => tracing::warn!(error = %e, "读取界面语言失败，使用默认语言"),
    }

    let result = run(&state, command).await;
    state.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[{}] {}", e.code(), e.user_message());
            ExitCode::FAILURE
        }
    }
}
