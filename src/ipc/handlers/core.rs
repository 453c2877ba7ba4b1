use crate::courses::{search_courses, CourseQuery, COURSES, NON_CBCS_COURSES};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "courses": COURSES.len(),
            "nadCourse": state.nad_course,
            "cgpaCourse": state.cgpa.course(),
        }),
    )
}

fn handle_courses_list(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let query: CourseQuery = if req.params.is_null() {
        CourseQuery::default()
    } else {
        match serde_json::from_value(req.params.clone()) {
            Ok(q) => q,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        }
    };
    let courses: Vec<serde_json::Value> = search_courses(&query)
        .into_iter()
        .map(|c| {
            json!({
                "name": c.name,
                "sems": c.sems,
                "cbcs": c.cbcs,
                "label": c.cbcs_label(),
            })
        })
        .collect();
    ok(&req.id, json!({ "courses": courses }))
}

fn handle_courses_non_cbcs(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "courses": NON_CBCS_COURSES }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.nonCbcs" => Some(handle_courses_non_cbcs(state, req)),
        _ => None,
    }
}
