use crate::infra::BloodBankServices;
use bloodbank::auth::{Caller, Role, TokenSigner};
use bloodbank::config::AppConfig;
use bloodbank::error::AppError;
use bloodbank::scoring::{
    calculate_priority, can_donate, classify_by_absolute_count, classify_by_capacity_fraction,
    classify_by_days_to_expiry, days_since, days_until, next_eligible_date, RequestUrgency,
};
use bloodbank::workflows::dashboard::DashboardOverview;
use bloodbank::workflows::domain::{parse_timestamp, Address, BloodType, UserId};
use bloodbank::workflows::donors::{ContactDetails, DonorRegistration, Gender};
use bloodbank::workflows::inventory::{export_stock_to_path, StockLotSubmission, StockSource};
use bloodbank::workflows::requests::{BloodRequestSubmission, DoctorContact};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct PriorityScoreArgs {
    /// Urgency tier: low, medium, high or emergency
    #[arg(long)]
    pub(crate) urgency: String,
    /// Deadline for the request (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) required_by: DateTime<Utc>,
    /// Evaluation time (defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub(crate) struct EligibilityScoreArgs {
    /// Most recent donation (RFC 3339 or YYYY-MM-DD); omit for first-time donors
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) last_donation: Option<DateTime<Utc>>,
    /// Evaluation time (defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub(crate) struct StockScoreArgs {
    /// Units on hand
    #[arg(long)]
    pub(crate) units: u32,
    /// Lot capacity, enables the capacity-fraction tier
    #[arg(long)]
    pub(crate) max_units: Option<u32>,
    /// Days until the lot expires, enables the expiry tier
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) days_to_expiry: Option<i64>,
}

#[derive(Args, Debug)]
pub(crate) struct TokenArgs {
    /// Subject of the token
    #[arg(long)]
    pub(crate) user_id: String,
    /// Role claim: admin, hospital or user
    #[arg(long, value_parser = parse_role)]
    pub(crate) role: Role,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting time (defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Write the seeded inventory as CSV to this path
    #[arg(long)]
    pub(crate) export_csv: Option<PathBuf>,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::parse(raw).ok_or_else(|| format!("unknown role '{raw}' (expected admin, hospital or user)"))
}

pub(crate) fn run_priority_score(args: PriorityScoreArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(Utc::now);
    println!("{}", priority_report(&args.urgency, args.required_by, now));
    Ok(())
}

pub(crate) fn run_eligibility_score(args: EligibilityScoreArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(Utc::now);
    println!("{}", eligibility_report(args.last_donation, now));
    Ok(())
}

pub(crate) fn run_stock_score(args: StockScoreArgs) -> Result<(), AppError> {
    println!(
        "{}",
        stock_report(args.units, args.max_units, args.days_to_expiry)
    );
    Ok(())
}

pub(crate) fn run_token(args: TokenArgs) -> Result<(), AppError> {
    if args.user_id.trim().is_empty() {
        return Err(AppError::InvalidArgument("user id must not be empty".to_string()));
    }

    let config = AppConfig::load()?;
    let signer = TokenSigner::new(&config.auth.token_secret);
    let token = signer
        .issue(&Caller::new(args.user_id, args.role))
        .map_err(|err| AppError::Workflow(Box::new(err)))?;
    println!("{token}");
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(Utc::now);
    let services = BloodBankServices::in_memory();
    let seeded = seed_demo_data(&services, now)?;

    println!("Blood bank demo");
    println!(
        "Seeded {} stock lots, {} donors and {} requests",
        seeded.stock_lots, seeded.donors, seeded.requests
    );

    let overview = services.dashboard.overview(now)?;
    println!("{}", render_dashboard(&overview));

    if let Some(path) = args.export_csv {
        let lots = services.inventory.list_available(now)?;
        export_stock_to_path(&lots, &path)?;
        println!("\nExported {} lots to {}", lots.len(), path.display());
    }

    Ok(())
}

fn priority_report(raw_urgency: &str, required_by: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let urgency = RequestUrgency::parse(raw_urgency);
    let days = days_until(required_by, now);
    let priority = calculate_priority(urgency, required_by, now);
    [
        format!("urgency: {}", urgency.label()),
        format!("days until required: {days}"),
        format!("priority: {priority}"),
    ]
    .join("\n")
}

fn eligibility_report(last_donation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();
    match last_donation {
        Some(last) => lines.push(format!("days since last donation: {}", days_since(last, now))),
        None => lines.push("days since last donation: never donated".to_string()),
    }
    let eligible = can_donate(last_donation, now);
    lines.push(format!("can donate: {}", if eligible { "yes" } else { "no" }));
    lines.push(format!(
        "next eligible date: {}",
        next_eligible_date(last_donation, now).format("%Y-%m-%d")
    ));
    lines.join("\n")
}

fn stock_report(units: u32, max_units: Option<u32>, days_to_expiry: Option<i64>) -> String {
    let mut lines = vec![format!(
        "absolute count tier: {}",
        classify_by_absolute_count(units).label()
    )];
    if let Some(max_units) = max_units {
        lines.push(format!(
            "capacity tier: {}",
            classify_by_capacity_fraction(units, max_units).label()
        ));
    }
    if let Some(days) = days_to_expiry {
        lines.push(format!("expiry tier: {}", classify_by_days_to_expiry(days).label()));
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SeedSummary {
    pub(crate) stock_lots: usize,
    pub(crate) donors: usize,
    pub(crate) requests: usize,
}

/// (type, units, days to expiry); every lot holds at most 100 units.
const DEMO_STOCK: [(BloodType, u32, i64); 8] = [
    (BloodType::APositive, 45, 12),
    (BloodType::ANegative, 20, 8),
    (BloodType::BPositive, 65, 18),
    (BloodType::BNegative, 15, 5),
    (BloodType::AbPositive, 30, 10),
    (BloodType::AbNegative, 12, 7),
    (BloodType::OPositive, 80, 20),
    (BloodType::ONegative, 25, 14),
];

struct DemoDonor {
    name: &'static str,
    email: &'static str,
    city: &'static str,
    blood_type: BloodType,
    born: (i32, u32, u32),
    gender: Gender,
    weight_kg: f64,
    donated_days_ago: Option<i64>,
}

const DEMO_DONORS: [DemoDonor; 4] = [
    DemoDonor {
        name: "Alex Rivera",
        email: "alex.rivera@example.org",
        city: "Springfield",
        blood_type: BloodType::ONegative,
        born: (1989, 3, 14),
        gender: Gender::Male,
        weight_kg: 78.0,
        donated_days_ago: None,
    },
    DemoDonor {
        name: "Priya Shah",
        email: "priya.shah@example.org",
        city: "Springfield",
        blood_type: BloodType::APositive,
        born: (1994, 11, 2),
        gender: Gender::Female,
        weight_kg: 61.5,
        donated_days_ago: Some(30),
    },
    DemoDonor {
        name: "Morgan Chen",
        email: "morgan.chen@example.org",
        city: "Shelbyville",
        blood_type: BloodType::BNegative,
        born: (1979, 7, 21),
        gender: Gender::Other,
        weight_kg: 70.2,
        donated_days_ago: Some(90),
    },
    DemoDonor {
        name: "Taylor Brooks",
        email: "taylor.brooks@example.org",
        city: "Capital City",
        blood_type: BloodType::AbNegative,
        born: (2001, 1, 9),
        gender: Gender::Female,
        weight_kg: 55.0,
        donated_days_ago: None,
    },
];

/// (patient, type, units, urgency, days until required, reason)
const DEMO_REQUESTS: [(&str, BloodType, u32, RequestUrgency, i64, &str); 4] = [
    ("Jordan Lee", BloodType::ONegative, 4, RequestUrgency::Emergency, 1, "Trauma surgery"),
    ("Casey Morgan", BloodType::APositive, 2, RequestUrgency::High, 3, "Scheduled transplant"),
    ("Riley Quinn", BloodType::BPositive, 1, RequestUrgency::Medium, 10, "Anemia treatment"),
    ("Avery Kim", BloodType::AbNegative, 2, RequestUrgency::Low, 20, "Elective procedure"),
];

/// Populate every workflow with the sample data used by the demo and by
/// `APP_SEED_DEMO`.
pub(crate) fn seed_demo_data(
    services: &BloodBankServices,
    now: DateTime<Utc>,
) -> Result<SeedSummary, AppError> {
    let admin = Caller::new("demo-admin", Role::Admin);
    let hospital = UserId("demo-hospital".to_string());

    for (blood_type, units, days) in DEMO_STOCK {
        services.inventory.add(
            &admin,
            StockLotSubmission {
                blood_type,
                units,
                max_units: 100,
                hospital: Some(hospital.clone()),
                location: Address {
                    name: Some("Central Blood Bank".to_string()),
                    city: Some("Springfield".to_string()),
                    ..Address::default()
                },
                expiration_date: now + Duration::days(days),
                source: StockSource::Donation,
                notes: None,
            },
            now,
        )?;
    }

    for (index, donor) in DEMO_DONORS.iter().enumerate() {
        let (year, month, day) = donor.born;
        let date_of_birth = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            AppError::InvalidArgument(format!("invalid birth date for {}", donor.name))
        })?;
        let caller = Caller::new(format!("demo-donor-{}", index + 1), Role::User);
        services.donors.register(
            &caller,
            DonorRegistration {
                contact: ContactDetails {
                    name: donor.name.to_string(),
                    email: donor.email.to_string(),
                    city: Some(donor.city.to_string()),
                    ..ContactDetails::default()
                },
                blood_type: donor.blood_type,
                date_of_birth,
                gender: donor.gender,
                weight_kg: donor.weight_kg,
                height_cm: 170.0,
                last_donation: donor.donated_days_ago.map(|days| now - Duration::days(days)),
                medical_history: Vec::new(),
                medications: Vec::new(),
                emergency_contact: None,
                preferred_donation_center: Some("Central Blood Bank".to_string()),
            },
            now,
        )?;
    }

    let requester = Caller::new(hospital.0.clone(), Role::Hospital);
    for (patient, blood_type, units, urgency, days, reason) in DEMO_REQUESTS {
        services.requests.submit(
            &requester,
            BloodRequestSubmission {
                patient_name: patient.to_string(),
                blood_type,
                units,
                urgency,
                hospital: Address {
                    name: Some("Springfield General".to_string()),
                    ..Address::default()
                },
                doctor: DoctorContact::default(),
                reason: reason.to_string(),
                required_by: now + Duration::days(days),
                notes: None,
            },
            now,
        )?;
    }

    Ok(SeedSummary {
        stock_lots: DEMO_STOCK.len(),
        donors: DEMO_DONORS.len(),
        requests: DEMO_REQUESTS.len(),
    })
}

fn render_dashboard(overview: &DashboardOverview) -> String {
    let mut lines = vec![format!(
        "\nDashboard as of {}",
        overview.generated_at.format("%Y-%m-%d %H:%M UTC")
    )];

    lines.push(format!(
        "- Donors: {} registered | {} eligible | {} available now",
        overview.donors.total, overview.donors.eligible, overview.donors.available
    ));
    lines.push(format!(
        "- Requests: {} pending | {} urgent",
        overview.pending_requests,
        overview.urgent_requests.len()
    ));
    for request in &overview.urgent_requests {
        lines.push(format!(
            "  - [{}] {} {} x{} for {} (due {})",
            request.priority,
            request.urgency.label(),
            request.blood_type,
            request.units,
            request.patient_name,
            request.required_by.format("%Y-%m-%d")
        ));
    }

    lines.push(format!("\nStock overview ({} units)", overview.total_units));
    for summary in &overview.stock {
        let percentage = summary
            .percentage
            .map(|value| format!("{value}%"))
            .unwrap_or_else(|| "n/a".to_string());
        lines.push(format!(
            "  - {}: {}/{} units ({}) {}",
            summary.blood_type,
            summary.total_units,
            summary.max_units,
            percentage,
            summary.urgency.label()
        ));
    }

    lines.push("\nLow stock alerts".to_string());
    if overview.low_stock.is_empty() {
        lines.push("  - none".to_string());
    }
    for lot in &overview.low_stock {
        lines.push(format!(
            "  - {}: {}/{} units, {} days until expiry",
            lot.blood_type, lot.units, lot.max_units, lot.days_until_expiration
        ));
    }

    lines.push("\nExpiring within 7 days".to_string());
    if overview.expiring_soon.is_empty() {
        lines.push("  - none".to_string());
    }
    for lot in &overview.expiring_soon {
        lines.push(format!(
            "  - {}: {} units expire {}",
            lot.blood_type,
            lot.units,
            lot.expiration_date.format("%Y-%m-%d")
        ));
    }

    lines.join("\n")
}
