//! Sample Prediction Client
//!
//! Generates random Telco customer records and posts them to a running API.
//!
//! Usage: `cargo run --example sample_client -- [base_url] [count] [at_risk_rate] [delay_ms]`

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Customer record in the shape the API was trained on
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Customer {
    #[serde(rename = "customerID")]
    customer_id: String,
    #[serde(rename = "gender")]
    gender: &'static str,
    senior_citizen: u8,
    partner: &'static str,
    dependents: &'static str,
    #[serde(rename = "tenure")]
    tenure: u32,
    phone_service: &'static str,
    multiple_lines: &'static str,
    internet_service: &'static str,
    online_security: &'static str,
    online_backup: &'static str,
    device_protection: &'static str,
    tech_support: &'static str,
    #[serde(rename = "StreamingTV")]
    streaming_tv: &'static str,
    streaming_movies: &'static str,
    contract: &'static str,
    paperless_billing: &'static str,
    payment_method: &'static str,
    monthly_charges: f64,
    /// Sent as a string, the way the raw dataset stores it
    total_charges: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    prediction: u8,
    probability: f64,
}

const YES_NO: &[&str] = &["No", "Yes"];
const SERVICE_ADDON: &[&str] = &["No", "No internet service", "Yes"];

/// Customer generator for exercising the API
struct CustomerGenerator {
    rng: rand::rngs::ThreadRng,
    customer_counter: u64,
}

impl CustomerGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            customer_counter: 0,
        }
    }

    /// A long-standing customer on a term contract
    fn generate_loyal(&mut self) -> Customer {
        let tenure = self.rng.gen_range(24..72);
        let monthly_charges: f64 = self.rng.gen_range(20.0..80.0);
        let contract = self.random_choice(&["One year", "Two year"]);
        let internet_service = self.random_choice(&["DSL", "No"]);
        let payment_method = self.random_choice(&[
            "Bank transfer (automatic)",
            "Credit card (automatic)",
            "Mailed check",
        ]);

        self.build(Profile {
            tenure,
            monthly_charges,
            contract,
            internet_service,
            payment_method,
            add_on: "Yes",
        })
    }

    /// A new month-to-month fiber customer with few add-ons
    fn generate_at_risk(&mut self) -> Customer {
        let tenure = self.rng.gen_range(0..12);
        let monthly_charges: f64 = self.rng.gen_range(70.0..115.0);

        self.build(Profile {
            tenure,
            monthly_charges,
            contract: "Month-to-month",
            internet_service: "Fiber optic",
            payment_method: "Electronic check",
            add_on: "No",
        })
    }

    fn build(&mut self, profile: Profile) -> Customer {
        self.customer_counter += 1;
        let phone_service = self.random_choice(YES_NO);
        let no_internet = profile.internet_service == "No";
        let add_on = |rng: &mut rand::rngs::ThreadRng| {
            if no_internet {
                "No internet service"
            } else if rng.gen_bool(0.7) {
                profile.add_on
            } else {
                SERVICE_ADDON[rng.gen_range(0..SERVICE_ADDON.len())]
            }
        };

        let customer_counter = self.customer_counter;
        Customer {
            customer_id: format!(
                "{:04}-{}",
                customer_counter,
                self.random_choice(&["PEZVU", "QWERT", "ZXCVB", "HJKLM"])
            ),
            gender: self.random_choice(&["Female", "Male"]),
            senior_citizen: u8::from(self.rng.gen_bool(0.16)),
            partner: self.random_choice(YES_NO),
            dependents: self.random_choice(YES_NO),
            tenure: profile.tenure,
            phone_service,
            multiple_lines: if phone_service == "No" {
                "No phone service"
            } else {
                self.random_choice(YES_NO)
            },
            internet_service: profile.internet_service,
            online_security: add_on(&mut self.rng),
            online_backup: add_on(&mut self.rng),
            device_protection: add_on(&mut self.rng),
            tech_support: add_on(&mut self.rng),
            streaming_tv: add_on(&mut self.rng),
            streaming_movies: add_on(&mut self.rng),
            contract: profile.contract,
            paperless_billing: self.random_choice(YES_NO),
            payment_method: profile.payment_method,
            monthly_charges: (profile.monthly_charges * 100.0).round() / 100.0,
            // a brand-new customer has a blank total in the raw data
            total_charges: if profile.tenure == 0 {
                " ".to_string()
            } else {
                format!("{:.2}", profile.monthly_charges * profile.tenure as f64)
            },
        }
    }

    fn random_choice(&mut self, choices: &[&'static str]) -> &'static str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

struct Profile {
    tenure: u32,
    monthly_charges: f64,
    contract: &'static str,
    internet_service: &'static str,
    payment_method: &'static str,
    add_on: &'static str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_client=info".parse()?),
        )
        .init();

    info!("Starting Sample Prediction Client");

    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/'))
        .unwrap_or("http://localhost:5000");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50);
    let at_risk_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.3);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        at_risk_rate = at_risk_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    match client.get(base_url).send().await {
        Ok(response) => info!(status = %response.status(), "API is reachable"),
        Err(e) => {
            warn!(error = %e, "API unreachable. Running in dry-run mode.");
            return run_dry_mode(count, at_risk_rate, delay_ms).await;
        }
    }

    let predict_url = format!("{}/predict", base_url);
    let mut generator = CustomerGenerator::new();
    let mut rng = rand::thread_rng();

    let mut churn_count = 0;
    let mut error_count = 0;

    for i in 0..count {
        let customer = if rng.gen_bool(at_risk_rate) {
            generator.generate_at_risk()
        } else {
            generator.generate_loyal()
        };

        let response = client.post(&predict_url).json(&customer).send().await?;
        if response.status().is_success() {
            let result: PredictResponse = response.json().await?;
            if result.prediction == 1 {
                churn_count += 1;
            }
            info!(
                customer = %customer.customer_id,
                prediction = result.prediction,
                probability = format!("{:.3}", result.probability),
                "Prediction"
            );
        } else {
            error_count += 1;
            let status = response.status();
            let body = response.text().await?;
            warn!(status = %status, body = %body, "Request failed");
        }

        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} customers ({} predicted to churn, {} errors)",
                i + 1,
                count,
                churn_count,
                error_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} customers ({} predicted to churn, {} errors)",
        count, churn_count, error_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, at_risk_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no API connection)");

    let mut generator = CustomerGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let customer = if rng.gen_bool(at_risk_rate) {
            generator.generate_at_risk()
        } else {
            generator.generate_loyal()
        };

        if (i + 1) % 10 == 0 || i == 0 {
            let json = serde_json::to_string_pretty(&customer)?;
            info!("Sample customer {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
