use std::{env, fs, path::Path};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        db::models::address::Address::decl(),
        db::models::address::AddressWithCustomerCount::decl(),
        db::models::customer::Customer::decl(),
        db::models::customer::CustomerSummary::decl(),
        db::models::customer::CustomerDetail::decl(),
        db::models::pet::Species::decl(),
        db::models::pet::HealthStatus::decl(),
        db::models::pet::Pet::decl(),
        db::models::pet::PetSummary::decl(),
        db::models::schedule::ExamStatus::decl(),
        db::models::schedule::Schedule::decl(),
        db::models::schedule::ScheduleWithPet::decl(),
        db::models::user::User::decl(),
        utils::pagination::Pagination::decl(),
        services::services::auth::Session::decl(),
        services::services::list_cache::CacheStats::decl(),
        server::routes::addresses::AddressPayload::decl(),
        server::routes::customers::CustomerPayload::decl(),
        server::routes::pets::PetPayload::decl(),
        server::routes::schedules::SchedulePayload::decl(),
        server::routes::auth::LoginRequest::decl(),
        server::routes::auth::SessionInfo::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| {
            let trimmed = d.trim_start();
            if trimmed.starts_with("export") {
                trimmed.to_string()
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `generate_types`. Do not edit it by hand.\n\n{}\n",
        body
    )
}

fn main() {
    let check_mode = env::args().any(|arg| arg == "--check");
    let shared_path = Path::new("shared");
    let types_path = shared_path.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&types_path).unwrap_or_default();
        if current == generated {
            println!("✅ shared/types.ts is up to date.");
            std::process::exit(0);
        } else {
            eprintln!("❌ shared/types.ts is not up to date. Run `cargo run --bin generate_types`.");
            std::process::exit(1);
        }
    }

    if let Err(e) = fs::create_dir_all(shared_path) {
        eprintln!("Failed to create {}: {e}", shared_path.display());
        std::process::exit(1);
    }
    if let Err(e) = fs::write(&types_path, generated) {
        eprintln!("Failed to write {}: {e}", types_path.display());
        std::process::exit(1);
    }
    println!("✅ TypeScript types generated in shared/");
}
