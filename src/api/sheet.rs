//! Implements the `Sheet` trait against Google. Value reads and batched value writes go through
//! `sheets::Client`; spreadsheet metadata, tab creation, appends and the Drive lookup are plain
//! REST calls made with `reqwest`.

use crate::api::{a1, Sheet, SheetRange, TokenProvider};
use crate::error::Res;
use anyhow::{bail, Context};
use serde_json::{json, Value};
use sheets::types::{
    BatchUpdateValuesRequest, DateTimeRenderOption, Dimension, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use tracing::{debug, trace};
use url::Url;

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Implements the `Sheet` trait for a Google spreadsheet. It takes a `TokenProvider`, which it
/// asks for a fresh token before each call.
pub(crate) struct GoogleSheet {
    spreadsheet_id: String,
    token_provider: TokenProvider,
    client: sheets::Client,
    http: reqwest::Client,
}

impl GoogleSheet {
    pub(crate) async fn new(spreadsheet_id: String, mut token_provider: TokenProvider) -> Res<Self> {
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            spreadsheet_id,
            token_provider,
            client,
            http: reqwest::Client::new(),
        })
    }

    /// Refreshes the sheets client with a new access token if needed
    async fn refresh_client(&mut self) -> Res<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }

    fn spreadsheet_url(&self, suffix: &str) -> Res<Url> {
        let mut url = Url::parse(SHEETS_BASE_URL).context("Invalid Sheets API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("The Sheets API URL cannot be a base"))?
            .push(&format!("{}{suffix}", self.spreadsheet_id));
        Ok(url)
    }

    /// Fetches spreadsheet metadata restricted to `fields`.
    async fn metadata(&mut self, fields: &str) -> Res<Value> {
        let mut url = self.spreadsheet_url("")?;
        url.query_pairs_mut().append_pair("fields", fields);
        let token = self.token_provider.token().await?;
        let request = self.http.get(url).bearer_auth(token);
        send_json(request, "Sheets metadata").await
    }
}

#[async_trait::async_trait]
impl Sheet for GoogleSheet {
    async fn title(&mut self) -> Res<String> {
        let body = self.metadata("properties.title").await?;
        body.pointer("/properties/title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("Spreadsheet metadata is missing the title")
    }

    async fn sheet_names(&mut self) -> Res<Vec<String>> {
        let body = self.metadata("sheets.properties.title").await?;
        let names = body
            .get("sheets")
            .and_then(Value::as_array)
            .map(|sheets| {
                sheets
                    .iter()
                    .filter_map(|s| s.pointer("/properties/title").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    async fn add_sheet(&mut self, name: &str, rows: u32, cols: u32) -> Res<()> {
        debug!("Adding sheet '{name}' ({rows} rows x {cols} columns)");
        let url = self.spreadsheet_url(":batchUpdate")?;
        let token = self.token_provider.token().await?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": name,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });
        let request = self.http.post(url).bearer_auth(token).json(&body);
        send_json(request, "Sheets addSheet")
            .await
            .with_context(|| format!("Failed to add sheet '{name}'"))?;
        Ok(())
    }

    async fn get_range(&mut self, range: &str) -> Res<Vec<Vec<String>>> {
        trace!("get_range for {range}");
        self.refresh_client().await?;
        let response = self
            .client
            .spreadsheets()
            .values_get(
                &self.spreadsheet_id,
                range,
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch {range}"))?;
        Ok(response.body.values)
    }

    async fn append_rows(&mut self, sheet_name: &str, rows: &[Vec<String>]) -> Res<()> {
        trace!("append_rows for {sheet_name}: {} rows", rows.len());
        let mut url = self.spreadsheet_url("")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("The Sheets API URL cannot be a base"))?
            .push("values")
            .push(&format!("{}:append", a1(sheet_name, "A1")));
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let token = self.token_provider.token().await?;
        let body = json!({ "majorDimension": "ROWS", "values": rows });
        let request = self.http.post(url).bearer_auth(token).json(&body);
        send_json(request, "Sheets append")
            .await
            .with_context(|| format!("Failed to append rows to '{sheet_name}'"))?;
        Ok(())
    }

    async fn write_ranges(&mut self, data: &[SheetRange]) -> Res<()> {
        self.refresh_client().await?;
        let value_ranges: Vec<ValueRange> = data
            .iter()
            .map(|sr| ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: sr.range.clone(),
                values: sr.values.clone(),
            })
            .collect();

        let request = BatchUpdateValuesRequest {
            data: value_ranges,
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(&self.spreadsheet_id, &request)
            .await
            .map_err(map_client_error)
            .context("Failed to write ranges")?;
        Ok(())
    }
}

/// Finds the id of the spreadsheet named `name` among the files shared with the service account.
pub(super) async fn find_spreadsheet_id(
    token_provider: &mut TokenProvider,
    name: &str,
) -> Res<String> {
    let query = format!(
        "name = '{}' and mimeType = '{SPREADSHEET_MIME_TYPE}' and trashed = false",
        name.replace('\\', "\\\\").replace('\'', "\\'")
    );
    let mut url = Url::parse(DRIVE_FILES_URL).context("Invalid Drive API URL")?;
    url.query_pairs_mut()
        .append_pair("q", &query)
        .append_pair("fields", "files(id,name)")
        .append_pair("pageSize", "10");
    let token = token_provider.token().await?;
    let request = reqwest::Client::new().get(url).bearer_auth(token);
    let body = send_json(request, "Drive files.list").await?;

    let files = body
        .get("files")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let first = match files.as_slice() {
        [] => bail!(
            "No spreadsheet named '{name}' is shared with {}",
            token_provider.client_email()
        ),
        [only] => only,
        [first, ..] => {
            debug!(
                "{} spreadsheets are named '{name}', using the first one",
                files.len()
            );
            first
        }
    };
    first
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("Google Drive API response missing 'id' field")
}

/// Sends `request` and parses the JSON body, turning non-success statuses into errors.
async fn send_json(request: reqwest::RequestBuilder, what: &str) -> Res<Value> {
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to send {what} request"))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        bail!("{what} failed with status {status}: {body}");
    }

    response
        .json()
        .await
        .with_context(|| format!("Failed to parse {what} response"))
}

/// Creates a new sheets client with a refreshed access token.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Res<sheets::Client> {
    let access_token = token_provider.token().await?;

    // The sheets crate requires client_id, client_secret, redirect_uri and refresh_token, but API
    // calls only need the access token.
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token,
        String::new(),
    ))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    let error_name = match &e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    };
    anyhow::Error::new(e).context(error_name)
}
