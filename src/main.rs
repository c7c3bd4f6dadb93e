#[macro_use]
extern crate rocket;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use rocket::State;
use rocket::form::Form;
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::response::Redirect;
use rocket::serde::Serialize;
use rocket_dyn_templates::Template;
use uuid::Uuid;

use farmbook::models::{
    ClassificationRecord, FinanceKind, FinanceRecord, Gender, TIMESTAMP_FORMAT,
};
use farmbook::money::{FormatPolicy, parse_amount_to_cents};
use farmbook::report::ReportKind;
use farmbook::store::Store;
use farmbook::summary::{FinancialSummary, lifetime_summary};
use farmbook::{pdf, report};

#[derive(FromForm)]
struct FinanceForm {
    tag: String,
    amount: String,
}

#[derive(FromForm)]
struct ClassificationForm {
    name: String,
    gender: String,
    breed: String,
    new_borns: u32,
    weight: f64,
    dead_count: u32,
    vaccination_date: String,
    details: Option<String>,
}

#[derive(Serialize)]
struct SummaryView {
    total_revenue: String,
    total_expenditure: String,
    profit_or_loss: String,
    is_profit: bool,
}

#[derive(Serialize)]
struct FinanceView {
    id: String,
    tag: String,
    amount: String,
    amount_input: String,
    recorded_at: String,
}

#[derive(Serialize)]
struct ClassificationView {
    id: String,
    name: String,
    gender: String,
    breed: String,
    new_borns: u32,
    weight: String,
    dead_count: u32,
    vaccination_date: String,
    details: Option<String>,
    recorded_at: String,
}

#[derive(Responder)]
#[response(content_type = "application/pdf")]
struct PdfReport {
    bytes: Vec<u8>,
    disposition: Header<'static>,
}

fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn today_ymd() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn month_start_ymd() -> String {
    Local::now().date_naive().format("%Y-%m-01").to_string()
}

fn summary_view(policy: &FormatPolicy, summary: FinancialSummary) -> SummaryView {
    SummaryView {
        total_revenue: policy.money(summary.total_revenue_cents),
        total_expenditure: policy.money(summary.total_expenditure_cents),
        profit_or_loss: policy.money(summary.profit_or_loss_cents.abs()),
        is_profit: summary.profit_or_loss_cents >= 0,
    }
}

fn finance_view(policy: &FormatPolicy, record: FinanceRecord) -> FinanceView {
    let cents = record.amount_cents;
    FinanceView {
        id: record.id.to_string(),
        tag: record.tag,
        amount: policy.money(cents),
        amount_input: format!("{}.{:02}", cents / 100, cents % 100),
        recorded_at: record.recorded_at,
    }
}

fn classification_view(policy: &FormatPolicy, record: ClassificationRecord) -> ClassificationView {
    ClassificationView {
        id: record.id.to_string(),
        name: record.name,
        gender: record.gender.to_string(),
        breed: record.breed,
        new_borns: record.newborns,
        weight: policy.weight(record.weight_kg),
        dead_count: record.dead_count,
        vaccination_date: record.vaccination_date,
        details: record.details,
        recorded_at: record.recorded_at,
    }
}

fn render_error(message: &str) -> Template {
    Template::render(
        "error",
        serde_json::json!({
            "message": message,
            "summary": null,
        }),
    )
}

fn parse_id(raw: &str) -> Result<Uuid, Template> {
    Uuid::parse_str(raw.trim()).map_err(|_| render_error("Malformed record id"))
}

fn parse_ymd(raw: &str, label: &str) -> Result<NaiveDate, Template> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| render_error(&format!("{label} must be a YYYY-MM-DD date")))
}

#[get("/")]
fn dashboard(store: &State<Store>, policy: &State<FormatPolicy>) -> Template {
    let summary = summary_view(policy, lifetime_summary(store));
    let tables = store.load_all().unwrap_or_default();
    let context = serde_json::json!({
        "summary": summary,
        "revenue_count": tables.revenue.len(),
        "expenditure_count": tables.expenditure.len(),
        "classification_count": tables.classification.len(),
    });
    Template::render("dashboard", &context)
}

fn finance_page(
    store: &State<Store>,
    policy: &State<FormatPolicy>,
    kind: FinanceKind,
    edit: Option<String>,
) -> Template {
    let records = match store.load_finance(kind) {
        Ok(records) => records,
        Err(err) => return render_error(&err.to_string()),
    };
    let editing = edit
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .and_then(|id| records.iter().find(|record| record.id == id).cloned())
        .map(|record| finance_view(policy, record));
    let views: Vec<FinanceView> = records
        .into_iter()
        .map(|record| finance_view(policy, record))
        .collect();

    let context = serde_json::json!({
        "title": kind.label(),
        "slug": kind.slug(),
        "records": views,
        "editing": editing,
        "summary": summary_view(policy, lifetime_summary(store)),
    });
    Template::render("finance", &context)
}

fn add_finance(
    store: &State<Store>,
    kind: FinanceKind,
    form: FinanceForm,
) -> Result<Redirect, Template> {
    let tag = form.tag.trim();
    if tag.is_empty() {
        return Err(render_error("Name must not be empty"));
    }
    let amount_cents = parse_amount_to_cents(&form.amount)
        .ok_or_else(|| render_error("Amount must be a non-negative number"))?;
    let record = FinanceRecord {
        id: Uuid::new_v4(),
        tag: tag.to_string(),
        amount_cents,
        recorded_at: now_timestamp(),
    };
    store
        .add_finance(kind, record)
        .map_err(|err| render_error(&err.to_string()))?;
    Ok(Redirect::to(format!("/{}", kind.slug())))
}

fn update_finance(
    store: &State<Store>,
    kind: FinanceKind,
    id: &str,
    form: FinanceForm,
) -> Result<Redirect, Template> {
    let id = parse_id(id)?;
    let tag = form.tag.trim();
    if tag.is_empty() {
        return Err(render_error("Name must not be empty"));
    }
    let amount_cents = parse_amount_to_cents(&form.amount)
        .ok_or_else(|| render_error("Amount must be a non-negative number"))?;
    store
        .update_finance(kind, id, tag, amount_cents)
        .map_err(|err| render_error(&err.to_string()))?;
    Ok(Redirect::to(format!("/{}", kind.slug())))
}

fn delete_finance(store: &State<Store>, kind: FinanceKind, id: &str) -> Result<Redirect, Template> {
    let id = parse_id(id)?;
    store
        .delete_finance(kind, id)
        .map_err(|err| render_error(&err.to_string()))?;
    Ok(Redirect::to(format!("/{}", kind.slug())))
}

#[get("/revenue?<edit>")]
fn revenue(store: &State<Store>, policy: &State<FormatPolicy>, edit: Option<String>) -> Template {
    finance_page(store, policy, FinanceKind::Revenue, edit)
}

#[post("/revenue", data = "<form>")]
fn add_revenue(store: &State<Store>, form: Form<FinanceForm>) -> Result<Redirect, Template> {
    add_finance(store, FinanceKind::Revenue, form.into_inner())
}

#[post("/revenue/<id>", data = "<form>")]
fn update_revenue(
    store: &State<Store>,
    id: String,
    form: Form<FinanceForm>,
) -> Result<Redirect, Template> {
    update_finance(store, FinanceKind::Revenue, &id, form.into_inner())
}

#[post("/revenue/<id>/delete")]
fn delete_revenue(store: &State<Store>, id: String) -> Result<Redirect, Template> {
    delete_finance(store, FinanceKind::Revenue, &id)
}

#[get("/expenditure?<edit>")]
fn expenditure(
    store: &State<Store>,
    policy: &State<FormatPolicy>,
    edit: Option<String>,
) -> Template {
    finance_page(store, policy, FinanceKind::Expenditure, edit)
}

#[post("/expenditure", data = "<form>")]
fn add_expenditure(store: &State<Store>, form: Form<FinanceForm>) -> Result<Redirect, Template> {
    add_finance(store, FinanceKind::Expenditure, form.into_inner())
}

#[post("/expenditure/<id>", data = "<form>")]
fn update_expenditure(
    store: &State<Store>,
    id: String,
    form: Form<FinanceForm>,
) -> Result<Redirect, Template> {
    update_finance(store, FinanceKind::Expenditure, &id, form.into_inner())
}

#[post("/expenditure/<id>/delete")]
fn delete_expenditure(store: &State<Store>, id: String) -> Result<Redirect, Template> {
    delete_finance(store, FinanceKind::Expenditure, &id)
}

fn classification_from_form(form: ClassificationForm) -> Result<ClassificationRecord, Template> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(render_error("Name must not be empty"));
    }
    if form.weight < 0.0 {
        return Err(render_error("Weight must not be negative"));
    }
    parse_ymd(&form.vaccination_date, "Vaccination date")?;
    let details = form
        .details
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    Ok(ClassificationRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        gender: Gender::parse(&form.gender),
        breed: form.breed.trim().to_string(),
        newborns: form.new_borns,
        weight_kg: form.weight,
        dead_count: form.dead_count,
        vaccination_date: form.vaccination_date.trim().to_string(),
        details,
        recorded_at: now_timestamp(),
    })
}

#[get("/classification?<edit>")]
fn classification(
    store: &State<Store>,
    policy: &State<FormatPolicy>,
    edit: Option<String>,
) -> Template {
    let records = match store.load_classification() {
        Ok(records) => records,
        Err(err) => return render_error(&err.to_string()),
    };
    let editing = edit
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .and_then(|id| records.iter().find(|record| record.id == id).cloned())
        .map(|record| classification_view(policy, record));
    let views: Vec<ClassificationView> = records
        .into_iter()
        .map(|record| classification_view(policy, record))
        .collect();

    let context = serde_json::json!({
        "records": views,
        "editing": editing,
        "genders": ["Male", "Female", "Unknown"],
        "summary": summary_view(policy, lifetime_summary(store)),
    });
    Template::render("classification", &context)
}

#[post("/classification", data = "<form>")]
fn add_classification(
    store: &State<Store>,
    form: Form<ClassificationForm>,
) -> Result<Redirect, Template> {
    let record = classification_from_form(form.into_inner())?;
    store
        .add_classification(record)
        .map_err(|err| render_error(&err.to_string()))?;
    Ok(Redirect::to("/classification"))
}

#[post("/classification/<id>", data = "<form>")]
fn update_classification(
    store: &State<Store>,
    id: String,
    form: Form<ClassificationForm>,
) -> Result<Redirect, Template> {
    let id = parse_id(&id)?;
    // The fresh id and timestamp from the form record are discarded by the
    // store; only the editable fields are taken.
    let updated = classification_from_form(form.into_inner())?;
    store
        .update_classification(id, updated)
        .map_err(|err| render_error(&err.to_string()))?;
    Ok(Redirect::to("/classification"))
}

#[post("/classification/<id>/delete")]
fn delete_classification(store: &State<Store>, id: String) -> Result<Redirect, Template> {
    let id = parse_id(&id)?;
    store
        .delete_classification(id)
        .map_err(|err| render_error(&err.to_string()))?;
    Ok(Redirect::to("/classification"))
}

#[get("/reports")]
fn reports(store: &State<Store>, policy: &State<FormatPolicy>) -> Template {
    let context = serde_json::json!({
        "summary": summary_view(policy, lifetime_summary(store)),
        "month_start": month_start_ymd(),
        "today": today_ymd(),
        "kinds": ["Revenue", "Expenditure", "Classification", "All"],
    });
    Template::render("reports", &context)
}

#[get("/reports/download?<kind>&<start>&<end>")]
fn download_report(
    store: &State<Store>,
    policy: &State<FormatPolicy>,
    kind: String,
    start: String,
    end: String,
) -> Result<PdfReport, Template> {
    let kind = ReportKind::parse(&kind).ok_or_else(|| render_error("Unknown report type"))?;
    let start = parse_ymd(&start, "Start date")?;
    let end = parse_ymd(&end, "End date")?;

    let summary = lifetime_summary(store);
    let composed = report::compose(store.inner(), kind, start, end, summary, policy)
        .map_err(|err| render_error(&err.to_string()))?;
    let bytes = pdf::render(&composed, policy).map_err(|err| render_error(&err.to_string()))?;

    let filename = format!(
        "{}_report_{start}_to_{end}.pdf",
        kind.label().to_lowercase()
    );
    Ok(PdfReport {
        bytes,
        disposition: Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{filename}\""),
        ),
    })
}

#[launch]
fn rocket() -> _ {
    let mut data_path = PathBuf::from("data");
    std::fs::create_dir_all(&data_path).expect("create data directory");
    data_path.push("farm_data.xlsx");
    let store = Store::new(data_path);
    store.ensure_exists().expect("initialize workbook");

    rocket::build()
        .manage(store)
        .manage(FormatPolicy::default())
        .mount(
            "/",
            routes![
                dashboard,
                revenue,
                add_revenue,
                update_revenue,
                delete_revenue,
                expenditure,
                add_expenditure,
                update_expenditure,
                delete_expenditure,
                classification,
                add_classification,
                update_classification,
                delete_classification,
                reports,
                download_report
            ],
        )
        .mount("/static", FileServer::from("static"))
        .attach(Template::fairing())
}
