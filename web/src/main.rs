#[macro_use]
extern crate rocket;

use pricing_common::{
    fixtures::{self, AddressSuggestion, PlanRow},
    pdf_fixture,
};
use rocket::{
    http::ContentType,
    response::{content::RawHtml, Redirect},
    serde::json::Json,
};

const PRICING_HTML: &str = include_str!("../static/pricing.html");
const PLAN_VIEWER_HTML: &str = include_str!("../static/plan-viewer.html");

#[get("/")]
fn index() -> Redirect {
    Redirect::to(uri!(pricing))
}

#[get("/pricing.html")]
fn pricing() -> RawHtml<&'static str> {
    RawHtml(PRICING_HTML)
}

#[get("/plan-viewer.html")]
fn plan_viewer() -> RawHtml<&'static str> {
    RawHtml(PLAN_VIEWER_HTML)
}

#[get("/api/addresses?<q>")]
fn addresses(q: String) -> Json<Vec<AddressSuggestion>> {
    Json(fixtures::suggest_addresses(&q))
}

#[get("/api/plans?<postcode>&<electricity>&<gas>")]
fn plans(postcode: String, electricity: bool, gas: bool) -> Json<Vec<PlanRow>> {
    Json(fixtures::plans_for(&postcode, electricity, gas))
}

#[get("/plans/<file>")]
fn plan_pdf(file: &str) -> Option<(ContentType, Vec<u8>)> {
    let bpid = file.strip_suffix(".pdf")?;
    let plan = fixtures::find_plan(bpid)?;
    Some((ContentType::PDF, pdf_fixture::plan_fact_sheet(&plan)))
}

/// A fact sheet that downloads as zero bytes.
#[get("/plans/empty.pdf")]
fn empty_pdf() -> (ContentType, Vec<u8>) {
    (ContentType::PDF, Vec::new())
}

#[launch]
fn rocket() -> _ {
    rocket::build().mount(
        "/",
        routes![index, pricing, plan_viewer, addresses, plans, plan_pdf, empty_pdf],
    )
}

#[cfg(test)]
mod tests {
    use super::rocket;
    use pricing_common::{fixtures::PlanRow, FuelType};
    use rocket::{
        http::{ContentType, Status},
        local::blocking::Client,
    };

    fn client() -> Client {
        Client::tracked(rocket()).expect("valid rocket instance")
    }

    #[test]
    fn root_redirects_to_pricing_page() {
        let client = client();
        let response = client.get("/").dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/pricing.html"));
    }

    #[test]
    fn pricing_page_has_the_lookup_and_results() {
        let client = client();
        let response = client.get("/pricing.html").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::HTML));
        let body = response.into_string().unwrap();
        for marker in [
            r#"id="address-lookup""#,
            r#"role="listbox""#,
            r#"id="tabpanel-0""#,
            r#"id="searchResultsContainer""#,
        ] {
            assert!(body.contains(marker), "missing {}", marker);
        }
    }

    #[test]
    fn suggests_addresses() {
        let client = client();
        let response = client
            .get("/api/addresses?q=17%20Bolinda%20Road%2C%20Balwyn%20North")
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().unwrap();
        assert!(body.contains("17 Bolinda Road, Balwyn North VIC 3104"), "{}", body);
        assert!(!body.contains("Court"), "{}", body);
    }

    #[test]
    fn filters_plans_by_fuel() {
        let client = client();
        let plans: Vec<PlanRow> = client
            .get("/api/plans?postcode=3104&electricity=false&gas=true")
            .dispatch()
            .into_json()
            .unwrap();
        assert!(!plans.is_empty());
        assert!(plans.iter().all(|plan| plan.fuel == FuelType::Gas));
    }

    #[test]
    fn serves_fact_sheets() {
        let client = client();
        let response = client.get("/plans/ORI2201GS.pdf").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::PDF));
        assert!(response.into_bytes().unwrap().starts_with(b"%PDF-"));

        assert_eq!(client.get("/plans/UNKNOWN.pdf").dispatch().status(), Status::NotFound);
        assert_eq!(client.get("/plans/ORI2201GS").dispatch().status(), Status::NotFound);
    }

    #[test]
    fn empty_fact_sheet_has_no_bytes() {
        let client = client();
        let response = client.get("/plans/empty.pdf").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::PDF));
        assert_eq!(response.into_bytes(), Some(Vec::new()));
    }

    #[test]
    fn plan_viewer_is_html() {
        let client = client();
        let response = client.get("/plan-viewer.html?bpid=ORI2201GS").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::HTML));
        assert!(!response.into_string().unwrap().contains(".pdf"));
    }

    #[test]
    fn pricing_page_knows_its_link_modes() {
        let body = client().get("/pricing.html").dispatch().into_string().unwrap();
        assert!(body.contains(r#"linkMode === "inert""#));
        assert!(body.contains("/plan-viewer.html"));
    }
}
