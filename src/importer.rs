// 🚚 Content importer - drives the destination side of one export file
//
// ContentImporter is the seam where the real destination writer plugs in.
// ReplayImporter is the reference implementation: it walks a parsed export
// honouring the plan and emits the full event stream, assigning destination
// ids without writing content anywhere (preview runs, tests).

use crate::export::{ExportPost, ParsedExport};
use crate::progress::{EntityKind, ImportEvent, ImportObserver, InsertError};
use crate::reconciliation::ResolvedMapping;
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================================================
// IMPORT PLAN
// ============================================================================

/// Everything the importer needs to know besides the export itself
#[derive(Debug, Clone, Default)]
pub struct ImportPlan {
    /// Export logins and their destination user ids (parallel vectors)
    pub mapping: ResolvedMapping,

    pub fetch_attachments: bool,

    pub resize_images: bool,

    /// Export post ids already imported from earlier files in this command
    pub processed_posts: HashSet<u64>,
}

impl ImportPlan {
    pub fn new(mapping: ResolvedMapping) -> Self {
        ImportPlan {
            mapping,
            fetch_attachments: true,
            resize_images: true,
            processed_posts: HashSet::new(),
        }
    }
}

/// What happened during one file's import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Export post ids handled by this run (imported or failed)
    pub processed_posts: Vec<u64>,
    pub inserted_posts: usize,
    pub failed_posts: usize,
    pub skipped_posts: usize,
    pub remapped_posts: usize,
    pub comments: usize,
    pub terms_created: usize,
}

pub trait ContentImporter {
    fn import(
        &mut self,
        export: &ParsedExport,
        plan: &ImportPlan,
        observer: &mut dyn ImportObserver,
    ) -> ImportSummary;
}

// ============================================================================
// REPLAY IMPORTER
// ============================================================================

#[derive(Debug)]
pub struct ReplayImporter {
    next_post_id: u64,
    next_comment_id: u64,
    next_term_id: u64,
    /// (taxonomy, name) → term id; terms persist across files
    terms: HashMap<(String, String), u64>,
}

impl ReplayImporter {
    pub fn new() -> Self {
        ReplayImporter {
            next_post_id: 1,
            next_comment_id: 1,
            next_term_id: 1,
            terms: HashMap::new(),
        }
    }

    fn term_id(
        &mut self,
        taxonomy: &str,
        name: &str,
        observer: &mut dyn ImportObserver,
        summary: &mut ImportSummary,
    ) -> u64 {
        let key = (taxonomy.to_string(), name.to_string());
        if let Some(id) = self.terms.get(&key) {
            return *id;
        }

        let id = self.next_term_id;
        self.next_term_id += 1;
        self.terms.insert(key, id);
        summary.terms_created += 1;

        observer.on_event(&ImportEvent::TermCreated {
            name: name.to_string(),
        });

        id
    }

    fn insert_post(
        &mut self,
        post: &ExportPost,
        plan: &ImportPlan,
        observer: &mut dyn ImportObserver,
        summary: &mut ImportSummary,
    ) {
        if post.post_type.trim().is_empty() {
            summary.failed_posts += 1;
            observer.on_event(&ImportEvent::ItemInserted {
                kind: EntityKind::Post,
                id: post.post_id,
                error: Some(InsertError::new(
                    "invalid_post_type",
                    "Post type must not be empty",
                )),
            });
            return;
        }

        // Terms exist before the post that uses them
        let mut by_taxonomy: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
        for term in &post.terms {
            let id = self.term_id(&term.domain, &term.name, observer, summary);
            by_taxonomy.entry(term.domain.as_str()).or_default().push(id);
        }

        let new_id = self.next_post_id;
        self.next_post_id += 1;
        summary.inserted_posts += 1;

        if plan.mapping.user_for(&post.post_author).is_some() {
            summary.remapped_posts += 1;
        }

        observer.on_event(&ImportEvent::ItemInserted {
            kind: EntityKind::Post,
            id: new_id,
            error: None,
        });

        for (taxonomy, term_ids) in by_taxonomy {
            observer.on_event(&ImportEvent::TermsAssignedToPost {
                term_ids,
                taxonomy: taxonomy.to_string(),
            });
        }

        for meta in &post.postmeta {
            observer.on_event(&ImportEvent::MetaAdded {
                post_id: new_id,
                key: meta.key.clone(),
            });
        }

        observer.on_event(&ImportEvent::BatchStarted {
            kind: EntityKind::Comment,
            size: post.comments.len() as u64,
        });
        for _comment in &post.comments {
            let comment_id = self.next_comment_id;
            self.next_comment_id += 1;
            summary.comments += 1;

            observer.on_event(&ImportEvent::ItemInserted {
                kind: EntityKind::Comment,
                id: comment_id,
                error: None,
            });
        }
    }
}

impl Default for ReplayImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentImporter for ReplayImporter {
    fn import(
        &mut self,
        export: &ParsedExport,
        plan: &ImportPlan,
        observer: &mut dyn ImportObserver,
    ) -> ImportSummary {
        let mut summary = ImportSummary::default();

        observer.on_event(&ImportEvent::BatchStarted {
            kind: EntityKind::Post,
            size: export.posts.len() as u64,
        });

        for post in &export.posts {
            observer.on_event(&ImportEvent::ItemProcessed {
                kind: EntityKind::Post,
                id: post.post_id,
                title: Some(post.post_title.clone()),
                post_type: Some(post.post_type.clone()),
            });

            if plan.processed_posts.contains(&post.post_id) {
                tracing::debug!(post_id = post.post_id, "post already imported, skipping");
                summary.skipped_posts += 1;
                continue;
            }

            if post.is_attachment() && !plan.fetch_attachments {
                tracing::debug!(post_id = post.post_id, "attachments skipped");
                summary.skipped_posts += 1;
                continue;
            }

            if post.is_attachment() && !plan.resize_images {
                tracing::debug!(post_id = post.post_id, "image sizes will not be generated");
            }

            self.insert_post(post, plan, observer, &mut summary);
            summary.processed_posts.push(post.post_id);
        }

        summary
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportComment, ExportMeta, ExportTerm};

    /// Records every event it sees
    #[derive(Default)]
    struct Recorder {
        events: Vec<ImportEvent>,
    }

    impl ImportObserver for Recorder {
        fn on_event(&mut self, event: &ImportEvent) {
            self.events.push(event.clone());
        }
    }

    fn sample_export() -> ParsedExport {
        let mut hello = ExportPost::new(10, "Hello world!", "jdoe");
        hello.terms = vec![
            ExportTerm {
                name: "News".to_string(),
                slug: "news".to_string(),
                domain: "category".to_string(),
            },
            ExportTerm {
                name: "rust".to_string(),
                slug: "rust".to_string(),
                domain: "post_tag".to_string(),
            },
        ];
        hello.postmeta = vec![ExportMeta {
            key: "_edit_last".to_string(),
            value: "1".to_string(),
        }];
        hello.comments = vec![
            ExportComment {
                comment_id: 1,
                comment_author: "reader".to_string(),
                comment_content: "Nice".to_string(),
            },
            ExportComment {
                comment_id: 2,
                comment_author: "reader".to_string(),
                comment_content: "Again".to_string(),
            },
        ];

        let mut photo = ExportPost::new(11, "photo.jpg", "jdoe");
        photo.post_type = "attachment".to_string();

        ParsedExport {
            authors: Vec::new(),
            posts: vec![hello, photo],
        }
    }

    #[test]
    fn test_replay_emits_lifecycle_in_order() {
        let mut importer = ReplayImporter::new();
        let mut recorder = Recorder::default();
        let plan = ImportPlan::new(ResolvedMapping::default());

        let summary = importer.import(&sample_export(), &plan, &mut recorder);

        assert_eq!(summary.inserted_posts, 2);
        assert_eq!(summary.comments, 2);
        assert_eq!(summary.terms_created, 2);
        assert_eq!(summary.processed_posts, vec![10, 11]);

        assert_eq!(
            recorder.events[0],
            ImportEvent::BatchStarted {
                kind: EntityKind::Post,
                size: 2
            }
        );
        assert!(matches!(
            recorder.events[1],
            ImportEvent::ItemProcessed { id: 10, .. }
        ));
        assert_eq!(
            recorder.events[2],
            ImportEvent::TermCreated {
                name: "News".to_string()
            }
        );
        assert!(recorder.events.contains(&ImportEvent::TermsAssignedToPost {
            term_ids: vec![2],
            taxonomy: "post_tag".to_string(),
        }));
        assert!(recorder.events.contains(&ImportEvent::MetaAdded {
            post_id: 1,
            key: "_edit_last".to_string(),
        }));
    }

    #[test]
    fn test_skipped_attachments_and_processed_posts() {
        let mut importer = ReplayImporter::new();
        let mut recorder = Recorder::default();
        let mut plan = ImportPlan::new(ResolvedMapping::default());
        plan.fetch_attachments = false;
        plan.processed_posts.insert(10);

        let summary = importer.import(&sample_export(), &plan, &mut recorder);

        assert_eq!(summary.inserted_posts, 0);
        assert_eq!(summary.skipped_posts, 2);
        assert!(summary.processed_posts.is_empty());
    }

    #[test]
    fn test_empty_post_type_is_reported_not_fatal() {
        let mut broken = ExportPost::new(5, "Broken", "jdoe");
        broken.post_type = String::new();
        let export = ParsedExport {
            authors: Vec::new(),
            posts: vec![broken, ExportPost::new(6, "Fine", "jdoe")],
        };

        let mut importer = ReplayImporter::new();
        let mut recorder = Recorder::default();
        let summary = importer.import(&export, &ImportPlan::new(ResolvedMapping::default()), &mut recorder);

        assert_eq!(summary.failed_posts, 1);
        assert_eq!(summary.inserted_posts, 1);
        assert!(recorder.events.iter().any(|e| matches!(
            e,
            ImportEvent::ItemInserted { error: Some(err), .. } if err.code == "invalid_post_type"
        )));
    }

    #[test]
    fn test_remapped_posts_follow_mapping() {
        let mapping = ResolvedMapping {
            imported_authors: vec!["jdoe".to_string()],
            user_map: vec![3],
        };
        let mut importer = ReplayImporter::new();
        let mut recorder = Recorder::default();

        let summary = importer.import(&sample_export(), &ImportPlan::new(mapping), &mut recorder);

        assert_eq!(summary.remapped_posts, 2);
    }
}
