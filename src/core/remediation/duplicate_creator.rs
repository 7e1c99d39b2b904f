// Builds a "fresh creative" copy of a flagged ad in the same ad group.
//
// Capacity is checked before anything else so a full ad group costs one
// count query and nothing more. The copy goes through the text rewriter
// unless rewriting is turned off; final URLs are carried over untouched.

use super::remediation_models::{DuplicateOutcome, RemediationSettings};
use crate::core::ads::{
    ad_group_resource, AdDetails, AdType, AdsError, AdsPlatform, Creative, NewAd,
    RemediationCandidate, ResponsiveCreative, SimpleTextCreative, TextAsset,
};
use crate::core::rewrite::{RewriteProvider, TextContext, TextRewriter};
use crate::core::throttle::with_quota_retry;

/// Assets shorter than this (after trimming) are dropped before copying.
pub const MIN_HEADLINE_CHARS: usize = 5;
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// What the platform requires of a responsive ad.
pub const MIN_RESPONSIVE_HEADLINES: usize = 3;
pub const MIN_RESPONSIVE_DESCRIPTIONS: usize = 2;

pub async fn duplicate_ad<P, R>(
    platform: &P,
    rewriter: &TextRewriter<R>,
    settings: &RemediationSettings,
    customer_id: &str,
    candidate: &RemediationCandidate,
) -> Result<DuplicateOutcome, AdsError>
where
    P: AdsPlatform,
    R: RewriteProvider,
{
    let ad_group_id = candidate.ad_group_id();
    let scope = settings.capacity_scope;

    let active = with_quota_retry(&settings.retry, "count_ads_in_ad_group", move || {
        platform.count_ads_in_ad_group(customer_id, ad_group_id, scope)
    })
    .await?;

    if active >= settings.ad_group_ad_limit {
        tracing::info!(
            ad_id = candidate.ad_id(),
            ad_group = ad_group_id,
            active,
            limit = settings.ad_group_ad_limit,
            "Ad group is at capacity, not duplicating"
        );
        return Ok(DuplicateOutcome::SkippedLimit { active });
    }

    let resource_name = candidate.resource_name();
    let details = with_quota_retry(&settings.retry, "fetch_ad_details", move || {
        platform.fetch_ad_details(customer_id, resource_name)
    })
    .await?;

    let details = match details {
        Some(details) => details,
        None => {
            tracing::warn!(ad_id = candidate.ad_id(), "Ad disappeared before it could be copied");
            return Ok(DuplicateOutcome::MissingCreative);
        }
    };

    for topic in &details.policy_topics {
        tracing::info!(
            ad_id = candidate.ad_id(),
            topic = %topic.topic,
            kind = %topic.kind,
            "Policy topic on original ad"
        );
    }

    let creative = match prepare_creative(rewriter, settings, &details).await {
        Ok(creative) => creative,
        Err(skip) => {
            tracing::info!(ad_id = candidate.ad_id(), "Not duplicating: {}", skip.describe());
            return Ok(skip);
        }
    };

    let new_ad = NewAd {
        ad_group_resource: ad_group_resource(customer_id, ad_group_id),
        final_urls: details.final_urls.clone(),
        creative,
    };

    if settings.dry_run {
        tracing::info!(
            ad_id = candidate.ad_id(),
            ad_group = ad_group_id,
            payload = ?new_ad,
            "[dry run] Would create duplicate ad"
        );
        return Ok(DuplicateOutcome::DryRun);
    }

    let new_ad = &new_ad;
    match with_quota_retry(&settings.retry, "create_ad", move || {
        platform.create_ad(customer_id, new_ad)
    })
    .await
    {
        Ok(created) => {
            tracing::info!(
                ad_id = candidate.ad_id(),
                ad_group = ad_group_id,
                resource = %created,
                "Created duplicate ad"
            );
            Ok(DuplicateOutcome::Created(created))
        }
        Err(AdsError::ResourceLimit(detail)) => {
            tracing::warn!(
                ad_id = candidate.ad_id(),
                ad_group = ad_group_id,
                "Platform refused duplicate, ad group limit reached: {}",
                detail
            );
            Ok(DuplicateOutcome::SkippedLimit { active })
        }
        Err(e) => Err(e),
    }
}

/// Turn the original creative into the one we will submit, or explain why
/// there is nothing worth submitting.
async fn prepare_creative<R: RewriteProvider>(
    rewriter: &TextRewriter<R>,
    settings: &RemediationSettings,
    details: &AdDetails,
) -> Result<Creative, DuplicateOutcome> {
    match (&details.ad_type, &details.creative) {
        (AdType::SimpleTextAd, Creative::SimpleText(original)) => Ok(Creative::SimpleText(
            copy_simple_text(rewriter, settings.rewrite_text, original).await,
        )),
        (AdType::ResponsiveAd, Creative::Responsive(original)) => {
            copy_responsive(rewriter, settings.rewrite_text, original)
                .await
                .map(Creative::Responsive)
        }
        (AdType::Unsupported(code), _) => Err(DuplicateOutcome::SkippedUnsupported(code.clone())),
        _ => Err(DuplicateOutcome::MissingCreative),
    }
}

async fn copy_simple_text<R: RewriteProvider>(
    rewriter: &TextRewriter<R>,
    rewrite: bool,
    original: &SimpleTextCreative,
) -> SimpleTextCreative {
    SimpleTextCreative {
        headline_part1: rewrite_slot(rewriter, rewrite, &original.headline_part1, TextContext::Headline).await,
        headline_part2: rewrite_slot(rewriter, rewrite, &original.headline_part2, TextContext::Headline).await,
        headline_part3: rewrite_slot(rewriter, rewrite, &original.headline_part3, TextContext::Headline).await,
        description: rewrite_slot(rewriter, rewrite, &original.description, TextContext::Description).await,
        description2: rewrite_slot(rewriter, rewrite, &original.description2, TextContext::Description).await,
        path1: original.path1.clone(),
        path2: original.path2.clone(),
    }
}

async fn rewrite_slot<R: RewriteProvider>(
    rewriter: &TextRewriter<R>,
    rewrite: bool,
    text: &Option<String>,
    context: TextContext,
) -> Option<String> {
    match text {
        Some(t) if rewrite && !t.is_empty() => Some(rewriter.rewrite_for(t, context).await),
        other => other.clone(),
    }
}

async fn copy_responsive<R: RewriteProvider>(
    rewriter: &TextRewriter<R>,
    rewrite: bool,
    original: &ResponsiveCreative,
) -> Result<ResponsiveCreative, DuplicateOutcome> {
    let headlines = usable_assets(&original.headlines, MIN_HEADLINE_CHARS);
    let descriptions = usable_assets(&original.descriptions, MIN_DESCRIPTION_CHARS);

    if headlines.len() < MIN_RESPONSIVE_HEADLINES
        || descriptions.len() < MIN_RESPONSIVE_DESCRIPTIONS
    {
        return Err(DuplicateOutcome::InsufficientContent {
            headlines: headlines.len(),
            descriptions: descriptions.len(),
        });
    }

    let mut copy = ResponsiveCreative {
        headlines: Vec::with_capacity(headlines.len()),
        descriptions: Vec::with_capacity(descriptions.len()),
        path1: original.path1.clone(),
        path2: original.path2.clone(),
    };
    for asset in headlines {
        copy.headlines
            .push(rewrite_asset(rewriter, rewrite, asset, TextContext::Headline).await);
    }
    for asset in descriptions {
        copy.descriptions
            .push(rewrite_asset(rewriter, rewrite, asset, TextContext::Description).await);
    }

    Ok(copy)
}

fn usable_assets(assets: &[TextAsset], min_chars: usize) -> Vec<&TextAsset> {
    assets
        .iter()
        .filter(|a| a.text.trim().chars().count() >= min_chars)
        .collect()
}

async fn rewrite_asset<R: RewriteProvider>(
    rewriter: &TextRewriter<R>,
    rewrite: bool,
    asset: &TextAsset,
    context: TextContext,
) -> TextAsset {
    let text = if rewrite {
        rewriter.rewrite_for(&asset.text, context).await
    } else {
        asset.text.clone()
    };
    TextAsset {
        text,
        pinned_field: asset.pinned_field.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ads::{ApprovalStatus, CapacityScope};
    use crate::core::remediation::test_support::{
        record, responsive_details, simple_text_details, FakePlatform,
    };
    use crate::core::rewrite::text_rewriter::HEADLINE_MAX_CHARS;
    use crate::core::rewrite::NoRewriteProvider;
    use crate::core::throttle::RetryPolicy;
    use std::time::Duration;

    fn settings() -> RemediationSettings {
        RemediationSettings {
            retry: RetryPolicy::once_after(Duration::from_secs(60)),
            ..RemediationSettings::default()
        }
    }

    fn rewriter() -> TextRewriter<NoRewriteProvider> {
        TextRewriter::new(NoRewriteProvider).unwrap()
    }

    fn candidate(platform: &FakePlatform, id: &str, group: &str, details: AdDetails) -> RemediationCandidate {
        let ad_type = details.ad_type.clone();
        let rec = record(id, group, "AMG Dubai", ad_type, ApprovalStatus::Disapproved);
        platform.add_ad(rec.clone(), Some(details));
        RemediationCandidate { record: rec }
    }

    #[tokio::test]
    async fn simple_text_copy_is_rewritten_and_keeps_final_url() {
        let platform = FakePlatform::new();
        let details = simple_text_details("1", "g1", "Fast Dubai Visa Service");
        let original_urls = details.final_urls.clone();
        let c = candidate(&platform, "1", "g1", details);

        let outcome = duplicate_ad(&platform, &rewriter(), &settings(), "123", &c)
            .await
            .unwrap();

        assert!(matches!(outcome, DuplicateOutcome::Created(_)));
        let created = platform.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].final_urls, original_urls);
        assert_eq!(created[0].ad_group_resource, "customers/123/adGroups/g1");
        match &created[0].creative {
            Creative::SimpleText(copy) => {
                assert_eq!(copy.headline_part1.as_deref(), Some("Quick Dubai Visa Service"));
                assert_eq!(copy.path1.as_deref(), Some("visa"));
                assert_eq!(copy.headline_part3, None);
            }
            other => panic!("unexpected creative {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_ad_group_is_skipped_without_create_call() {
        let platform = FakePlatform::new();
        let c = candidate(&platform, "1", "g1", simple_text_details("1", "g1", "Visa Help"));
        platform.add_ad(record("2", "g1", "AMG Dubai", AdType::SimpleTextAd, ApprovalStatus::Approved), None);
        platform.add_ad(record("3", "g1", "AMG Dubai", AdType::SimpleTextAd, ApprovalStatus::Approved), None);

        let outcome = duplicate_ad(&platform, &rewriter(), &settings(), "123", &c)
            .await
            .unwrap();

        assert_eq!(outcome, DuplicateOutcome::SkippedLimit { active: 3 });
        assert_eq!(platform.call_count("create_ad"), 0);
        assert_eq!(platform.call_count("fetch_ad_details"), 0);
    }

    #[tokio::test]
    async fn enabled_scope_ignores_paused_ads() {
        let platform = FakePlatform::new();
        let c = candidate(&platform, "1", "g1", simple_text_details("1", "g1", "Visa Help"));
        platform.add_ad(record("2", "g1", "AMG Dubai", AdType::SimpleTextAd, ApprovalStatus::Approved), None);
        platform.add_ad(record("3", "g1", "AMG Dubai", AdType::SimpleTextAd, ApprovalStatus::Approved), None);
        platform
            .update_ad_status("123", c.resource_name(), crate::core::ads::AdStatus::Paused)
            .await
            .unwrap();

        let settings = RemediationSettings {
            capacity_scope: CapacityScope::Enabled,
            ..settings()
        };
        let outcome = duplicate_ad(&platform, &rewriter(), &settings, "123", &c)
            .await
            .unwrap();

        assert!(matches!(outcome, DuplicateOutcome::Created(_)));
    }

    #[tokio::test]
    async fn responsive_with_two_valid_headlines_is_insufficient() {
        let platform = FakePlatform::new();
        let details = responsive_details(
            "1",
            "g1",
            &["Dubai Visa Online", "Apply Today", "Go", "  "],
            &["Trusted processing for every visa type.", "Families and tourists welcome here."],
        );
        let c = candidate(&platform, "1", "g1", details);

        let outcome = duplicate_ad(&platform, &rewriter(), &settings(), "123", &c)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DuplicateOutcome::InsufficientContent {
                headlines: 2,
                descriptions: 2
            }
        );
        assert_eq!(platform.call_count("create_ad"), 0);
    }

    #[tokio::test]
    async fn responsive_copy_keeps_pins_and_fits_limits() {
        let platform = FakePlatform::new();
        let mut details = responsive_details(
            "1",
            "g1",
            &["Fast Dubai Visa Service", "Express 24 Hour Processing Guaranteed", "Visa Help Desk"],
            &["Trusted processing for every visa type.", "Families and tourists welcome here."],
        );
        if let Creative::Responsive(r) = &mut details.creative {
            r.headlines[0] = TextAsset::pinned("Fast Dubai Visa Service", "HEADLINE_1");
        }
        let c = candidate(&platform, "1", "g1", details);

        duplicate_ad(&platform, &rewriter(), &settings(), "123", &c)
            .await
            .unwrap();

        let created = platform.created();
        let copy = match &created[0].creative {
            Creative::Responsive(r) => r.clone(),
            other => panic!("unexpected creative {other:?}"),
        };
        assert_eq!(copy.headlines.len(), 3);
        assert_eq!(copy.headlines[0].text, "Quick Dubai Visa Service");
        assert_eq!(copy.headlines[0].pinned_field.as_deref(), Some("HEADLINE_1"));
        assert!(copy
            .headlines
            .iter()
            .all(|h| h.text.chars().count() <= HEADLINE_MAX_CHARS));
    }

    #[tokio::test]
    async fn unsupported_type_is_skipped() {
        let platform = FakePlatform::new();
        let details = AdDetails {
            ad_type: AdType::Unsupported("IMAGE_AD".into()),
            creative: Creative::Unsupported,
            ..simple_text_details("1", "g1", "Visa")
        };
        let c = candidate(&platform, "1", "g1", details);

        let outcome = duplicate_ad(&platform, &rewriter(), &settings(), "123", &c)
            .await
            .unwrap();

        assert_eq!(outcome, DuplicateOutcome::SkippedUnsupported("IMAGE_AD".into()));
        assert_eq!(platform.call_count("create_ad"), 0);
    }

    #[tokio::test]
    async fn vanished_ad_is_missing_creative() {
        let platform = FakePlatform::new();
        let rec = record("1", "g1", "AMG Dubai", AdType::SimpleTextAd, ApprovalStatus::Disapproved);
        platform.add_ad(rec.clone(), None);

        let outcome = duplicate_ad(
            &platform,
            &rewriter(),
            &settings(),
            "123",
            &RemediationCandidate { record: rec },
        )
        .await
        .unwrap();

        assert_eq!(outcome, DuplicateOutcome::MissingCreative);
    }

    #[tokio::test]
    async fn dry_run_builds_but_does_not_submit() {
        let platform = FakePlatform::new();
        let c = candidate(&platform, "1", "g1", simple_text_details("1", "g1", "Fast Visa"));
        let settings = RemediationSettings {
            dry_run: true,
            ..settings()
        };

        let outcome = duplicate_ad(&platform, &rewriter(), &settings, "123", &c)
            .await
            .unwrap();

        assert_eq!(outcome, DuplicateOutcome::DryRun);
        assert_eq!(platform.call_count("create_ad"), 0);
    }

    #[tokio::test]
    async fn rewrite_disabled_copies_text_verbatim() {
        let platform = FakePlatform::new();
        let c = candidate(&platform, "1", "g1", simple_text_details("1", "g1", "Fast Dubai Visa Service"));
        let settings = RemediationSettings {
            rewrite_text: false,
            ..settings()
        };

        duplicate_ad(&platform, &rewriter(), &settings, "123", &c)
            .await
            .unwrap();

        match &platform.created()[0].creative {
            Creative::SimpleText(copy) => {
                assert_eq!(copy.headline_part1.as_deref(), Some("Fast Dubai Visa Service"))
            }
            other => panic!("unexpected creative {other:?}"),
        }
    }

    #[tokio::test]
    async fn platform_limit_error_becomes_skip() {
        let platform = FakePlatform::new();
        let c = candidate(&platform, "1", "g1", simple_text_details("1", "g1", "Visa Help"));
        platform.fail_next(
            "create_ad",
            AdsError::ResourceLimit("RESOURCE_LIMIT_EXCEEDED".into()),
        );

        let outcome = duplicate_ad(&platform, &rewriter(), &settings(), "123", &c)
            .await
            .unwrap();

        assert!(matches!(outcome, DuplicateOutcome::SkippedLimit { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn quota_error_on_create_retries_exactly_once() {
        let platform = FakePlatform::new();
        let c = candidate(&platform, "1", "g1", simple_text_details("1", "g1", "Visa Help"));
        platform.fail_next("create_ad", AdsError::Quota("quota".into()));
        platform.fail_next("create_ad", AdsError::Quota("quota".into()));

        let result = duplicate_ad(&platform, &rewriter(), &settings(), "123", &c).await;

        assert!(matches!(result, Err(AdsError::Quota(_))));
        assert_eq!(platform.call_count("create_ad"), 2);
    }

    #[tokio::test]
    async fn other_create_errors_propagate() {
        let platform = FakePlatform::new();
        let c = candidate(&platform, "1", "g1", simple_text_details("1", "g1", "Visa Help"));
        platform.fail_next("create_ad", AdsError::Api("INVALID_ARGUMENT".into()));

        let result = duplicate_ad(&platform, &rewriter(), &settings(), "123", &c).await;

        assert!(matches!(result, Err(AdsError::Api(_))));
    }
}
