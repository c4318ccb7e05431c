//! Declarative book schema and the argument sets derived from it.
//!
//! One field list drives the public schema document, the write arguments
//! of Create/Update, and the OpenAPI fragment.

use folio_http::error::AppError;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::entity_type::BOOK_TYPE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    String,
    Boolean,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
        }
    }
}

/// Response contexts a field is visible in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Context {
    View,
    Edit,
    Embed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub field_type: FieldType,
    pub contexts: &'static [Context],
    pub readonly: bool,
    /// Required when creating a book.
    pub required: bool,
}

const ALL_CONTEXTS: &[Context] = &[Context::View, Context::Edit, Context::Embed];
const VIEW_EDIT: &[Context] = &[Context::View, Context::Edit];

pub const ITEM_FIELDS: [FieldDescriptor; 4] = [
    FieldDescriptor {
        name: "id",
        description: "Unique identifier for the book.",
        field_type: FieldType::Integer,
        contexts: ALL_CONTEXTS,
        readonly: true,
        required: false,
    },
    FieldDescriptor {
        name: "title",
        description: "The title of the book.",
        field_type: FieldType::String,
        contexts: ALL_CONTEXTS,
        readonly: false,
        required: true,
    },
    FieldDescriptor {
        name: "content",
        description: "The content of the book.",
        field_type: FieldType::String,
        contexts: VIEW_EDIT,
        readonly: false,
        required: false,
    },
    FieldDescriptor {
        name: "status",
        description: "The status of the book (e.g., publish, draft).",
        field_type: FieldType::String,
        contexts: VIEW_EDIT,
        readonly: false,
        required: false,
    },
];

impl FieldDescriptor {
    fn to_json(&self) -> Value {
        let mut property = json!({
            "description": self.description,
            "type": self.field_type.as_str(),
            "context": self.contexts,
        });
        if self.readonly {
            property["readonly"] = Value::Bool(true);
        }
        if self.required {
            property["required"] = Value::Bool(true);
        }
        property
    }
}

/// The public item schema document.
pub fn item_schema() -> Value {
    let properties: Map<String, Value> = ITEM_FIELDS
        .iter()
        .map(|field| (field.name.to_string(), field.to_json()))
        .collect();

    json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "title": BOOK_TYPE,
        "type": "object",
        "properties": properties,
    })
}

/// An argument accepted by an endpoint, with its validation rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub arg_type: FieldType,
    pub default: Option<Value>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub choices: &'static [&'static str],
    pub required: bool,
}

impl ArgSpec {
    pub fn new(name: &'static str, arg_type: FieldType, description: &'static str) -> Self {
        Self {
            name,
            description,
            arg_type,
            default: None,
            minimum: None,
            maximum: None,
            choices: &[],
            required: false,
        }
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: i64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn to_json(&self) -> Value {
        let mut arg = json!({
            "description": self.description,
            "type": self.arg_type.as_str(),
            "required": self.required,
        });
        if let Some(default) = &self.default {
            arg["default"] = default.clone();
        }
        if let Some(minimum) = self.minimum {
            arg["minimum"] = minimum.into();
        }
        if let Some(maximum) = self.maximum {
            arg["maximum"] = maximum.into();
        }
        if !self.choices.is_empty() {
            arg["enum"] = json!(self.choices);
        }
        arg
    }

    fn coerce(&self, value: &Value) -> Result<Value, String> {
        let coerced = match self.arg_type {
            FieldType::Integer => {
                let number = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| format!("{} is not of type integer.", self.name))?;
                self.check_range(number)?;
                Value::from(number)
            }
            FieldType::Boolean => match value {
                Value::Bool(b) => Value::Bool(*b),
                Value::Number(n) if n.as_i64() == Some(0) => Value::Bool(false),
                Value::Number(n) if n.as_i64() == Some(1) => Value::Bool(true),
                Value::String(s) => match s.to_ascii_lowercase().as_str() {
                    "true" | "1" => Value::Bool(true),
                    "false" | "0" | "" => Value::Bool(false),
                    _ => return Err(format!("{} is not of type boolean.", self.name)),
                },
                _ => return Err(format!("{} is not of type boolean.", self.name)),
            },
            FieldType::String => match value {
                Value::String(s) => Value::String(s.clone()),
                _ => return Err(format!("{} is not of type string.", self.name)),
            },
        };

        if !self.choices.is_empty() {
            let allowed = coerced
                .as_str()
                .is_some_and(|choice| self.choices.contains(&choice));
            if !allowed {
                return Err(format!(
                    "{} is not one of {}.",
                    self.name,
                    self.choices.join(", ")
                ));
            }
        }

        Ok(coerced)
    }

    fn check_range(&self, number: i64) -> Result<(), String> {
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) if number < min || number > max => Err(format!(
                "{} must be between {} (inclusive) and {} (inclusive)",
                self.name, min, max
            )),
            (Some(min), None) if number < min => Err(format!(
                "{} must be greater than or equal to {}",
                self.name, min
            )),
            (None, Some(max)) if number > max => Err(format!(
                "{} must be less than or equal to {}",
                self.name, max
            )),
            _ => Ok(()),
        }
    }
}

impl From<&FieldDescriptor> for ArgSpec {
    fn from(field: &FieldDescriptor) -> Self {
        let spec = ArgSpec::new(field.name, field.field_type, field.description);
        if field.required {
            spec.required()
        } else {
            spec
        }
    }
}

/// Write operations whose arguments derive from the item schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMethod {
    Create,
    Edit,
}

/// Item schema minus read-only fields; `required` only holds for Create.
pub fn endpoint_args(method: WriteMethod) -> Vec<ArgSpec> {
    ITEM_FIELDS
        .iter()
        .filter(|field| !field.readonly)
        .map(|field| {
            let mut arg = ArgSpec::from(field);
            arg.required = method == WriteMethod::Create && field.required;
            arg
        })
        .collect()
}

pub const ORDERBY_CHOICES: &[&str] = &["date", "id", "title", "slug"];
pub const ORDER_CHOICES: &[&str] = &["asc", "desc"];
pub const MAX_PER_PAGE: i64 = 100;

pub fn collection_params() -> Vec<ArgSpec> {
    vec![
        ArgSpec::new("page", FieldType::Integer, "Current page of the collection.")
            .default_value(1.into())
            .minimum(1),
        ArgSpec::new(
            "per_page",
            FieldType::Integer,
            "Maximum number of items to be returned in response.",
        )
        .default_value(10.into())
        .minimum(1)
        .maximum(MAX_PER_PAGE),
        ArgSpec::new(
            "search",
            FieldType::String,
            "Limit results to those matching a search query.",
        ),
        ArgSpec::new("orderby", FieldType::String, "Sort collection by book attribute.")
            .default_value("date".into())
            .choices(ORDERBY_CHOICES),
        ArgSpec::new(
            "order",
            FieldType::String,
            "Order sort attribute ascending or descending.",
        )
        .default_value("desc".into())
        .choices(ORDER_CHOICES),
    ]
}

pub fn delete_params() -> Vec<ArgSpec> {
    vec![ArgSpec::new(
        "force",
        FieldType::Boolean,
        "Whether to bypass trash and force deletion.",
    )
    .default_value(false.into())]
}

pub fn id_param() -> ArgSpec {
    ArgSpec::new("id", FieldType::Integer, "Unique identifier for the book.")
}

/// Check `input` against `specs`, applying defaults and type coercion.
///
/// Only declared arguments are kept. Explicit `null` counts as absent.
pub fn validate(specs: &[ArgSpec], input: &Map<String, Value>) -> Result<Map<String, Value>, AppError> {
    let mut output = Map::new();
    let mut missing = Vec::new();
    let mut invalid = Vec::new();

    for spec in specs {
        match input.get(spec.name).filter(|value| !value.is_null()) {
            None if spec.required => missing.push(spec.name),
            None => {
                if let Some(default) = &spec.default {
                    output.insert(spec.name.to_string(), default.clone());
                }
            }
            Some(value) => match spec.coerce(value) {
                Ok(value) => {
                    output.insert(spec.name.to_string(), value);
                }
                Err(reason) => invalid.push((spec.name, reason)),
            },
        }
    }

    if !missing.is_empty() {
        let details = missing
            .iter()
            .map(|name| json!({ "field": name, "error": "required" }))
            .collect();
        return Err(AppError::validation(
            details,
            format!("Missing parameter(s): {}", missing.join(", ")),
        )
        .with_code("rest_missing_callback_param"));
    }

    if !invalid.is_empty() {
        let names: Vec<_> = invalid.iter().map(|(name, _)| *name).collect();
        let details = invalid
            .iter()
            .map(|(name, reason)| json!({ "field": name, "error": reason }))
            .collect();
        return Err(AppError::validation(
            details,
            format!("Invalid parameter(s): {}", names.join(", ")),
        ));
    }

    Ok(output)
}

fn args_json(specs: &[ArgSpec]) -> Value {
    Value::Object(
        specs
            .iter()
            .map(|spec| (spec.name.to_string(), spec.to_json()))
            .collect(),
    )
}

/// Route description returned for `OPTIONS /books`.
pub fn describe_collection(namespace: &str) -> Value {
    json!({
        "namespace": namespace,
        "methods": ["GET", "POST"],
        "endpoints": [
            { "methods": ["GET"], "args": args_json(&collection_params()) },
            { "methods": ["POST"], "args": args_json(&endpoint_args(WriteMethod::Create)) },
        ],
        "schema": item_schema(),
    })
}

/// Route description returned for `OPTIONS /books/{id}`.
pub fn describe_item(namespace: &str) -> Value {
    let id = args_json(&[id_param()]);
    let mut edit = args_json(&endpoint_args(WriteMethod::Edit));
    let mut delete = args_json(&delete_params());
    for args in [&mut edit, &mut delete] {
        if let (Some(args), Some(id)) = (args.as_object_mut(), id.as_object()) {
            args.extend(id.clone());
        }
    }

    json!({
        "namespace": namespace,
        "methods": ["GET", "PUT", "PATCH", "DELETE"],
        "endpoints": [
            { "methods": ["GET"], "args": id },
            { "methods": ["PUT", "PATCH"], "args": edit },
            { "methods": ["DELETE"], "args": delete },
        ],
        "schema": item_schema(),
    })
}

fn openapi_parameters(specs: &[ArgSpec], location: &str) -> Vec<Value> {
    specs
        .iter()
        .map(|spec| {
            let mut schema = json!({ "type": spec.arg_type.as_str() });
            if let Some(default) = &spec.default {
                schema["default"] = default.clone();
            }
            if let Some(minimum) = spec.minimum {
                schema["minimum"] = minimum.into();
            }
            if let Some(maximum) = spec.maximum {
                schema["maximum"] = maximum.into();
            }
            if !spec.choices.is_empty() {
                schema["enum"] = json!(spec.choices);
            }
            json!({
                "name": spec.name,
                "in": location,
                "description": spec.description,
                "required": location == "path" || spec.required,
                "schema": schema,
            })
        })
        .collect()
}

fn openapi_write_schema(method: WriteMethod) -> Value {
    let args = endpoint_args(method);
    let properties: Map<String, Value> = args
        .iter()
        .map(|arg| {
            (
                arg.name.to_string(),
                json!({ "type": arg.arg_type.as_str(), "description": arg.description }),
            )
        })
        .collect();
    let required: Vec<_> = args.iter().filter(|arg| arg.required).map(|arg| arg.name).collect();

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn error_responses(codes: &[(&str, &str)]) -> Map<String, Value> {
    codes
        .iter()
        .map(|(status, description)| {
            (
                status.to_string(),
                json!({
                    "description": description,
                    "content": { "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    } }
                }),
            )
        })
        .collect()
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn operation(summary: &str, parameters: Vec<Value>, body: Option<Value>, success: (&str, Value), errors: &[(&str, &str)]) -> Value {
    let mut responses = error_responses(errors);
    responses.insert(success.0.to_string(), success.1);

    let mut operation = json!({
        "summary": summary,
        "tags": ["Books"],
        "responses": responses,
    });
    if !parameters.is_empty() {
        operation["parameters"] = Value::Array(parameters);
    }
    if let Some(body) = body {
        operation["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": body } }
        });
    }
    operation
}

/// OpenAPI fragment for the book routes, relative to the module namespace.
pub fn openapi_fragment() -> Value {
    let book_ref = json!({ "$ref": "#/components/schemas/Book" });
    let id = openapi_parameters(&[id_param()], "path");
    let mut delete_parameters = id.clone();
    delete_parameters.extend(openapi_parameters(&delete_params(), "query"));

    let list = operation(
        "List books",
        openapi_parameters(&collection_params(), "query"),
        None,
        ("200", json_response("Page of books", json!({ "type": "array", "items": book_ref }))),
        &[("400", "Invalid collection parameters")],
    );
    let create = operation(
        "Create a book",
        vec![],
        Some(openapi_write_schema(WriteMethod::Create)),
        ("201", json_response("Created book", book_ref.clone())),
        &[
            ("400", "Missing or invalid fields"),
            ("403", "Caller may not publish books"),
            ("500", "Store failure"),
        ],
    );
    let get = operation(
        "Get a book",
        id.clone(),
        None,
        ("200", json_response("Book", book_ref.clone())),
        &[("404", "Book not found")],
    );
    let update = operation(
        "Update a book",
        id,
        Some(openapi_write_schema(WriteMethod::Edit)),
        ("200", json_response("Updated book", book_ref.clone())),
        &[
            ("400", "Invalid fields"),
            ("403", "Caller may not edit this book"),
            ("404", "Book not found"),
            ("500", "Store failure"),
        ],
    );
    let delete = operation(
        "Delete a book",
        delete_parameters,
        None,
        (
            "200",
            json_response(
                "Deleted book",
                json!({
                    "type": "object",
                    "properties": { "deleted": { "type": "boolean" }, "previous": book_ref }
                }),
            ),
        ),
        &[
            ("403", "Caller may not delete this book"),
            ("404", "Book not found"),
            ("500", "Store failure"),
        ],
    );

    json!({
        "paths": {
            "/books": { "get": list, "post": create },
            "/books/{id}": { "get": get, "put": update.clone(), "patch": update, "delete": delete },
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "date": { "type": "string", "format": "date-time" },
                        "slug": { "type": "string" },
                        "status": { "type": "string" },
                        "title": { "type": "string" },
                        "content": { "type": "string" },
                        "author": { "type": "integer" }
                    },
                    "required": ["id", "date", "slug", "status", "title", "content", "author"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn schema_document_lists_every_field() {
        let schema = item_schema();
        assert_eq!(schema["title"], BOOK_TYPE);
        assert_eq!(schema["properties"]["id"]["readonly"], true);
        assert_eq!(schema["properties"]["title"]["required"], true);
        assert_eq!(schema["properties"]["content"]["context"], json!(["view", "edit"]));
    }

    #[test]
    fn write_args_drop_readonly_fields() {
        let create = endpoint_args(WriteMethod::Create);
        let names: Vec<_> = create.iter().map(|arg| arg.name).collect();
        assert_eq!(names, ["title", "content", "status"]);
        assert!(create[0].required);

        let edit = endpoint_args(WriteMethod::Edit);
        assert!(edit.iter().all(|arg| !arg.required));
    }

    #[test]
    fn collection_defaults_apply() {
        let args = validate(&collection_params(), &Map::new()).unwrap();
        assert_eq!(args["page"], 1);
        assert_eq!(args["per_page"], 10);
        assert_eq!(args["orderby"], "date");
        assert_eq!(args["order"], "desc");
        assert!(args.get("search").is_none());
    }

    #[test]
    fn query_strings_are_coerced() {
        let args = validate(
            &collection_params(),
            &input(json!({ "page": "3", "per_page": "25", "orderby": "title" })),
        )
        .unwrap();
        assert_eq!(args["page"], 3);
        assert_eq!(args["per_page"], 25);
        assert_eq!(args["orderby"], "title");
    }

    #[test]
    fn out_of_range_and_unknown_choices_fail() {
        for bad in [
            json!({ "page": "0" }),
            json!({ "per_page": "101" }),
            json!({ "per_page": "ten" }),
            json!({ "orderby": "author" }),
            json!({ "order": "up" }),
        ] {
            let err = validate(&collection_params(), &input(bad)).unwrap_err();
            assert_eq!(err.code(), "rest_invalid_param");
        }
    }

    #[test]
    fn missing_required_argument() {
        let err = validate(&endpoint_args(WriteMethod::Create), &input(json!({ "content": "x" })))
            .unwrap_err();
        assert_eq!(err.code(), "rest_missing_callback_param");

        let err = validate(&endpoint_args(WriteMethod::Create), &input(json!({ "title": null })))
            .unwrap_err();
        assert_eq!(err.code(), "rest_missing_callback_param");
    }

    #[test]
    fn strings_must_be_strings() {
        let err = validate(&endpoint_args(WriteMethod::Edit), &input(json!({ "title": 12 })))
            .unwrap_err();
        assert_eq!(err.code(), "rest_invalid_param");
    }

    #[test]
    fn force_accepts_boolean_spellings() {
        for (raw, expected) in [
            (json!("true"), true),
            (json!("1"), true),
            (json!(false), false),
            (json!(0), false),
        ] {
            let args = validate(&delete_params(), &input(json!({ "force": raw }))).unwrap();
            assert_eq!(args["force"], expected);
        }
        assert!(validate(&delete_params(), &input(json!({ "force": "maybe" }))).is_err());
    }

    #[test]
    fn item_description_includes_id_everywhere() {
        let description = describe_item("vendor/v1");
        for endpoint in description["endpoints"].as_array().unwrap() {
            assert!(endpoint["args"]["id"].is_object());
        }
        assert!(description["endpoints"][2]["args"]["force"].is_object());
    }

    #[test]
    fn openapi_fragment_covers_all_routes() {
        let fragment = openapi_fragment();
        for (path, method) in [
            ("/books", "get"),
            ("/books", "post"),
            ("/books/{id}", "get"),
            ("/books/{id}", "put"),
            ("/books/{id}", "patch"),
            ("/books/{id}", "delete"),
        ] {
            assert!(fragment["paths"][path][method].is_object(), "{method} {path}");
        }
        assert_eq!(
            fragment["paths"]["/books"]["post"]["requestBody"]["content"]["application/json"]["schema"]["required"],
            json!(["title"])
        );
    }
}
