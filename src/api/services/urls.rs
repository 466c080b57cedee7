//! 链接管理端点

use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, Responder, Result as ActixResult, web};
use futures_util::StreamExt;
use tracing::{error, info};

use crate::api::constants::MAX_BULK_UPLOAD_BYTES;
use crate::api::middleware::AuthedAccount;
use crate::errors::SnaplinkError;
use crate::services::{CreateLinkRequest, LinkService, ListQuery, UpdateLinkRequest};

use super::error_code::ErrorCode;
use super::helpers::{api_result, created_response, error_from_snaplink, error_response};
use super::types::{BulkCreateFile, BulkCreateResponse, ListParams, MessageResponse};

pub async fn create_link(
    AuthedAccount(account): AuthedAccount,
    body: web::Json<CreateLinkRequest>,
    links: web::Data<LinkService>,
) -> ActixResult<impl Responder> {
    Ok(match links.create(&account, &body).await {
        Ok(link) => created_response(links.view(link, None)),
        Err(e) => error_from_snaplink(&e),
    })
}

/// 读取上传的 JSON 文件（第一个文件字段，或名为 `file` 的字段）
async fn read_upload(payload: &mut Multipart) -> Result<Vec<u8>, HttpResponse> {
    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to parse multipart field: {}", e);
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::InvalidMultipartData,
                    &format!("Invalid multipart data: {}", e),
                ));
            }
        };

        let is_file = field.name() == Some("file")
            || field
                .content_disposition()
                .is_some_and(|cd| cd.get_filename().is_some());
        if !is_file {
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(bytes) => {
                    if data.len() + bytes.len() > MAX_BULK_UPLOAD_BYTES {
                        return Err(error_response(
                            StatusCode::BAD_REQUEST,
                            ErrorCode::BatchSizeTooLarge,
                            &format!(
                                "File size exceeds maximum {} KB",
                                MAX_BULK_UPLOAD_BYTES / 1024
                            ),
                        ));
                    }
                    data.extend_from_slice(&bytes);
                }
                Err(e) => {
                    return Err(error_response(
                        StatusCode::BAD_REQUEST,
                        ErrorCode::InvalidMultipartData,
                        &format!("Failed to read file: {}", e),
                    ));
                }
            }
        }
        return Ok(data);
    }

    Err(error_response(
        StatusCode::BAD_REQUEST,
        ErrorCode::InvalidMultipartData,
        "No file provided",
    ))
}

/// 批量创建：multipart 上传 `{ "urls": [...] }`，全部成功或全部失败
pub async fn bulk_create(
    AuthedAccount(account): AuthedAccount,
    mut payload: Multipart,
    links: web::Data<LinkService>,
) -> ActixResult<impl Responder> {
    let data = match read_upload(&mut payload).await {
        Ok(data) => data,
        Err(response) => return Ok(response),
    };

    let file: BulkCreateFile = match serde_json::from_slice(&data) {
        Ok(file) => file,
        Err(e) => {
            return Ok(error_from_snaplink(&SnaplinkError::serialization(format!(
                "Invalid bulk file: {}",
                e
            ))));
        }
    };

    info!(
        "Account {} bulk create request with {} urls",
        account.id,
        file.urls.len()
    );

    Ok(match links.bulk_create(&account, &file.urls).await {
        Ok(created) => {
            let items: Vec<_> = created.into_iter().map(|l| links.view(l, None)).collect();
            created_response(BulkCreateResponse {
                created: items.len(),
                items,
            })
        }
        Err(e) => error_from_snaplink(&e),
    })
}

/// 列出当前账户的链接；`export=true` 时以附件形式下载全部链接
pub async fn list_my_links(
    AuthedAccount(account): AuthedAccount,
    query: web::Query<ListParams>,
    links: web::Data<LinkService>,
) -> ActixResult<impl Responder> {
    let with_history = query.with_history.unwrap_or(false);

    if query.export.unwrap_or(false) {
        let export = match links.export(&account, with_history).await {
            Ok(export) => export,
            Err(e) => return Ok(error_from_snaplink(&e)),
        };
        let filename = export.filename();
        info!("Account {} exported {} links", account.id, export.total);

        return Ok(HttpResponse::Ok()
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(filename)],
            })
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(export));
    }

    let list_query = ListQuery {
        offset: query.offset.unwrap_or(0),
        limit: query.limit.unwrap_or(crate::services::link_service::DEFAULT_PAGE_SIZE),
        with_history,
    };
    Ok(api_result(links.list(&account, list_query).await))
}

pub async fn update_link(
    AuthedAccount(account): AuthedAccount,
    path: web::Path<i64>,
    body: web::Json<UpdateLinkRequest>,
    links: web::Data<LinkService>,
) -> ActixResult<impl Responder> {
    let result = links
        .update(&account, path.into_inner(), &body)
        .await
        .map(|link| links.view(link, None));
    Ok(api_result(result))
}

pub async fn delete_link(
    AuthedAccount(account): AuthedAccount,
    path: web::Path<i64>,
    links: web::Data<LinkService>,
) -> ActixResult<impl Responder> {
    let result = links
        .delete(&account, path.into_inner())
        .await
        .map(|_| MessageResponse {
            message: "Link deleted".to_string(),
        });
    Ok(api_result(result))
}
