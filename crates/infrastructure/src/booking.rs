use domain::{Attachment, BookingDetail, EventMessage, WorkStatus};
use shared::AppError;
use std::future::Future;
use tracing::{info, warn};

use crate::ims::ImsApi;

/// 運送会社への予約処理の結果
#[derive(Debug, Clone, PartialEq)]
pub enum BookingResult {
    /// 予約成功。ドキュメントに添付するラベル
    Label(Attachment),
    /// 業務上の失敗。ユーザー向けメッセージ
    Failed(String),
}

/// 予約イベント1件を処理
///
/// 1. ドキュメントを ON_GOING にする
/// 2. `booking` を実行
/// 3. ラベルを添付して DONE、または失敗メッセージを投稿して FAILED にする
///
/// セットアップ未登録などの業務エラーも FAILED として扱う。
/// ON_GOING 以降のシステムエラーはドキュメントを FAILED にした上で呼び出し側に返す。
/// エラーのログ出力は呼び出し側（`handle_eventbridge_error!`）で行う。
pub async fn process_booking<I, Fut>(
    ims: &I,
    detail: &BookingDetail,
    source: &str,
    booking: Fut,
) -> Result<BookingResult, AppError>
where
    I: ImsApi + ?Sized,
    Fut: Future<Output = Result<BookingResult, AppError>>,
{
    let document_id = detail.document_id;
    ims.set_work_status(document_id, WorkStatus::OnGoing).await?;

    match complete_booking(ims, detail, source, booking).await {
        Ok(result) => Ok(result),
        Err(error) => {
            if let Err(status_error) = ims.set_work_status(document_id, WorkStatus::Failed).await {
                warn!(error = %status_error, document_id, "Could not mark document as failed");
            }
            Err(error)
        }
    }
}

async fn complete_booking<I, Fut>(
    ims: &I,
    detail: &BookingDetail,
    source: &str,
    booking: Fut,
) -> Result<BookingResult, AppError>
where
    I: ImsApi + ?Sized,
    Fut: Future<Output = Result<BookingResult, AppError>>,
{
    let document_id = detail.document_id;

    let result = match booking.await {
        Ok(result) => result,
        Err(AppError::Domain(error)) if error.is_business_failure() => {
            BookingResult::Failed(format!("Failed to book shipment with {source}: {error}"))
        }
        Err(error) => return Err(error),
    };

    match &result {
        BookingResult::Label(label) => {
            ims.attach_to_document(document_id, label).await?;
            ims.set_work_status(document_id, WorkStatus::Done).await?;
            info!(document_id, file_name = %label.file_name, "Shipping label attached");
        }
        BookingResult::Failed(text) => {
            // メッセージを投稿できなくてもドキュメントは FAILED にする
            if let Err(error) = report_failure(ims, detail, source, text.clone()).await {
                warn!(error = %error, document_id, "Could not post failure message: {}", text);
            }
            ims.set_work_status(document_id, WorkStatus::Failed).await?;
            info!(document_id, "Booking failed: {}", text);
        }
    }

    Ok(result)
}

/// 予約イベントにエラーメッセージを投稿
async fn report_failure<I>(ims: &I, detail: &BookingDetail, source: &str, text: String) -> Result<(), AppError>
where
    I: ImsApi + ?Sized,
{
    match detail.event_id {
        Some(event_id) => {
            let message = EventMessage::error(source, text, detail);
            ims.post_event_message(event_id, &message).await
        }
        None => {
            warn!(document_id = detail.document_id, "No event to attach message to: {}", text);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ImsWrite, InMemoryIms};
    use domain::{DomainError, MessageType};

    fn detail(event_id: Option<i64>) -> BookingDetail {
        BookingDetail {
            document_id: 10,
            shipment_id: 20,
            context_id: 30,
            event_id,
            device_name: Some("PACK-02".to_string()),
            user_id: Some("ole".to_string()),
        }
    }

    #[tokio::test]
    async fn test_label_is_attached_and_document_done() {
        let ims = InMemoryIms::new();
        let label = Attachment::shipping_label(10, "JVBER".to_string());

        let result = process_booking(&ims, &detail(Some(1)), "GLSTransport", async {
            Ok(BookingResult::Label(label.clone()))
        })
        .await
        .unwrap();

        assert_eq!(result, BookingResult::Label(label.clone()));
        let state = ims.snapshot();
        assert_eq!(
            state.work_statuses,
            vec![(10, WorkStatus::OnGoing), (10, WorkStatus::Done)]
        );
        assert_eq!(state.attachments, vec![(10, label)]);
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn test_failure_posts_message_and_fails_document() {
        let ims = InMemoryIms::new();

        process_booking(&ims, &detail(Some(77)), "DFTransport", async {
            Ok(BookingResult::Failed("No shipping instruction matches shipment S-1".to_string()))
        })
        .await
        .unwrap();

        let state = ims.snapshot();
        assert_eq!(
            state.work_statuses,
            vec![(10, WorkStatus::OnGoing), (10, WorkStatus::Failed)]
        );
        let (event_id, message) = &state.messages[0];
        assert_eq!(*event_id, 77);
        assert_eq!(message.source, "DFTransport");
        assert_eq!(message.message_type, MessageType::Error);
        assert_eq!(message.device_name.as_deref(), Some("PACK-02"));
        assert!(state.attachments.is_empty());
    }

    #[tokio::test]
    async fn test_business_error_becomes_failed_booking() {
        let ims = InMemoryIms::new();

        let result = process_booking(&ims, &detail(Some(1)), "GLSTransport", async {
            Err(AppError::from(DomainError::CarrierNotFound("GLS".to_string())))
        })
        .await
        .unwrap();

        assert!(matches!(result, BookingResult::Failed(text) if text.contains("No carrier by the name GLS")));
        assert_eq!(ims.snapshot().messages.len(), 1);
    }

    #[tokio::test]
    async fn test_system_error_fails_document_and_propagates() {
        let ims = InMemoryIms::new();

        let error = process_booking(&ims, &detail(Some(1)), "GLSTransport", async {
            Err(AppError::NotFound("shipments/20".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(error, AppError::NotFound(_)));
        let state = ims.snapshot();
        assert_eq!(state.work_statuses.last(), Some(&(10, WorkStatus::Failed)));
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn test_failure_without_event_skips_message() {
        let ims = InMemoryIms::new();

        process_booking(&ims, &detail(None), "GLSTransport", async {
            Ok(BookingResult::Failed("rejected".to_string()))
        })
        .await
        .unwrap();

        let state = ims.snapshot();
        assert!(state.messages.is_empty());
        assert_eq!(state.work_statuses.last(), Some(&(10, WorkStatus::Failed)));
    }

    #[tokio::test]
    async fn test_attach_failure_fails_document() {
        let ims = InMemoryIms::new().failing(ImsWrite::Attachment);
        let label = Attachment::shipping_label(10, "JVBER".to_string());

        let error = process_booking(&ims, &detail(Some(1)), "GLSTransport", async move {
            Ok(BookingResult::Label(label))
        })
        .await
        .unwrap_err();

        assert!(matches!(error, AppError::Network(_)));
        assert_eq!(
            ims.snapshot().work_statuses,
            vec![(10, WorkStatus::OnGoing), (10, WorkStatus::Failed)]
        );
    }

    #[tokio::test]
    async fn test_message_failure_still_fails_document() {
        let ims = InMemoryIms::new().failing(ImsWrite::EventMessage);

        let result = process_booking(&ims, &detail(Some(77)), "DFTransport", async {
            Ok(BookingResult::Failed("rejected".to_string()))
        })
        .await
        .unwrap();

        assert_eq!(result, BookingResult::Failed("rejected".to_string()));
        let state = ims.snapshot();
        assert!(state.messages.is_empty());
        assert_eq!(
            state.work_statuses,
            vec![(10, WorkStatus::OnGoing), (10, WorkStatus::Failed)]
        );
    }
}
