//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `projdeck_core` linkage and print the crate version.
//! - Given `<db_path> <owner>`, dump that owner's active projects as JSON.

use projdeck_core::db::open_db;
use projdeck_core::{
    CallerIdentity, ProjectAggregate, ProjectService, SqliteProjectRepository,
    SqliteTodoRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("projdeck_core version={}", projdeck_core::core_version());

    let mut args = std::env::args().skip(1);
    let (Some(db_path), Some(owner)) = (args.next(), args.next()) else {
        return ExitCode::SUCCESS;
    };

    match list_projects(&db_path, &owner) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("projdeck: {message}");
            ExitCode::FAILURE
        }
    }
}

fn list_projects(db_path: &str, owner: &str) -> Result<String, String> {
    let caller = CallerIdentity::new(owner).ok_or("owner cannot be empty")?;
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let service = ProjectService::new(
        SqliteProjectRepository::new(&conn),
        SqliteTodoRepository::new(&conn),
    );

    let projects = service
        .list_projects(&caller)
        .map_err(|err| err.to_string())?;
    let views: Vec<_> = projects.iter().map(ProjectAggregate::json_view).collect();
    serde_json::to_string_pretty(&views).map_err(|err| err.to_string())
}
