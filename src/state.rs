//! Application state and intent dispatch
//!
//! [`AppState`] holds everything a dashboard view depends on. It only
//! changes through [`Intent`]s. [`Session`] pairs the state with the
//! analysis engine and the grouping cache and builds reports on demand.

use crate::analyzer::{
    search_users, AnalysisEngine, BasicStats, DetailList, DetailTarget, DetailView, Engagement,
    Grouping, GroupingKind, ImprovementSummary,
};
use crate::cache::{CacheStats, Fingerprint, GroupingCache};
use crate::reporter::{
    keyword_cloud, ranked, DashboardReport, Ranking, SentimentView, TeacherPage, UserRow,
    UserTable,
};
use crate::{rank_by, CountBucket, CourseFilter, Dataset, FeedbackRecord, LoadError, SortKey};
use crate::UserBucket;
use std::path::Path;
use tracing::{debug, info};

/// Everything a view depends on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub dataset: Option<Dataset>,
    pub filter: CourseFilter,
    pub user_sort: SortKey,
    pub block_sort: SortKey,
    pub teacher_sort: SortKey,
    /// Zero-based teacher ranking page
    pub teacher_page: usize,
}

/// A user action that changes [`AppState`]
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Replace the dataset. Parsing happens before dispatch, so a failed
    /// load never reaches the state.
    Load(Dataset),
    SetFilter(CourseFilter),
    SortUsers(SortKey),
    SortBlocks(SortKey),
    SortTeachers(SortKey),
    NextTeacherPage,
    PrevTeacherPage,
    /// Jump to a zero-based teacher page, clamped to the last page
    SetTeacherPage(usize),
    /// Drop the dataset and return to defaults
    Reset,
}

impl AppState {
    /// Apply an intent. `teacher_pages` is the current number of teacher
    /// pages and bounds `NextTeacherPage` and `SetTeacherPage`.
    pub fn apply(&mut self, intent: Intent, teacher_pages: usize) {
        match intent {
            Intent::Load(dataset) => {
                self.dataset = Some(dataset);
                self.teacher_page = 0;
            }
            Intent::SetFilter(filter) => {
                self.filter = filter;
                self.teacher_page = 0;
            }
            Intent::SortUsers(key) => self.user_sort = key,
            Intent::SortBlocks(key) => self.block_sort = key,
            Intent::SortTeachers(key) => {
                self.teacher_sort = key;
                self.teacher_page = 0;
            }
            Intent::NextTeacherPage => {
                if self.teacher_page + 1 < teacher_pages {
                    self.teacher_page += 1;
                }
            }
            Intent::PrevTeacherPage => {
                self.teacher_page = self.teacher_page.saturating_sub(1);
            }
            Intent::SetTeacherPage(page) => {
                self.teacher_page = page.min(teacher_pages.saturating_sub(1));
            }
            Intent::Reset => *self = AppState::default(),
        }
    }
}

/// State plus the machinery to compute views from it
#[derive(Debug, Default)]
pub struct Session {
    state: AppState,
    engine: AnalysisEngine,
    cache: GroupingCache,
}

impl Session {
    pub fn new(engine: AnalysisEngine) -> Self {
        Self {
            state: AppState::default(),
            engine,
            cache: GroupingCache::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn engine(&self) -> &AnalysisEngine {
        &self.engine
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn dispatch(&mut self, intent: Intent) {
        debug!(?intent, "dispatch");
        let pages = match intent {
            Intent::NextTeacherPage | Intent::SetTeacherPage(_) => self.teacher_pages(),
            _ => 0,
        };
        let resets = matches!(intent, Intent::Load(_) | Intent::Reset);
        self.state.apply(intent, pages);
        if resets {
            self.cache.clear();
        }
    }

    /// Parse export text and load it. On error the state is unchanged.
    pub fn load_text(&mut self, text: &str) -> Result<(), LoadError> {
        let dataset = Dataset::parse(text)?;
        self.dispatch(Intent::Load(dataset));
        Ok(())
    }

    /// Read and load an export file. On error the state is unchanged.
    pub fn load_path(&mut self, path: &Path) -> Result<(), LoadError> {
        let dataset = Dataset::from_path(path)?;
        info!(source = %dataset.source, records = dataset.total(), "loaded export");
        self.dispatch(Intent::Load(dataset));
        Ok(())
    }

    /// Reload an export in place. Filter and sorts survive any load; this
    /// also keeps the teacher page, clamped to the new page count.
    pub fn reload_path(&mut self, path: &Path) -> Result<(), LoadError> {
        let page = self.state.teacher_page;
        self.load_path(path)?;
        self.dispatch(Intent::SetTeacherPage(page));
        Ok(())
    }

    /// Records passing the current filter
    pub fn filtered(&self) -> Vec<&FeedbackRecord> {
        match &self.state.dataset {
            Some(dataset) => self.state.filter.apply(&dataset.records),
            None => Vec::new(),
        }
    }

    /// Identity of the current filtered record set
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        let dataset = self.state.dataset.as_ref()?;
        Some(Fingerprint::new(&dataset.content_hash, self.state.filter.tag()))
    }

    /// Grouping of the filtered records, memoized per filter state
    pub fn grouping(&mut self, kind: GroupingKind) -> Option<&Grouping> {
        let fingerprint = self.fingerprint()?;
        let dataset = self.state.dataset.as_ref()?;
        let filter = &self.state.filter;
        let engine = &self.engine;
        Some(self.cache.get_or_compute(&fingerprint, kind, || {
            engine.group(kind, &filter.apply(&dataset.records))
        }))
    }

    /// Number of teacher ranking pages; zero without teachers
    pub fn teacher_pages(&mut self) -> usize {
        let per_page = self.engine.limits().teachers_per_page.max(1);
        self.grouping(GroupingKind::Teacher)
            .map(|g| g.len().div_ceil(per_page))
            .unwrap_or(0)
    }

    /// Drill into the records behind one ranking entry or keyword
    pub fn detail(&self, target: DetailTarget) -> Option<DetailList> {
        self.detail_in(target, DetailView::Panel)
    }

    /// Like [`Session::detail`], capped for the given view
    pub fn detail_in(&self, target: DetailTarget, view: DetailView) -> Option<DetailList> {
        self.state.dataset.as_ref()?;
        let cap = view.cap(&target, self.engine.limits());
        Some(DetailList::compute(
            target,
            &self.filtered(),
            self.engine.scorer(),
            cap,
        ))
    }

    /// Known users matching `query`, most active first
    pub fn search_users(&mut self, query: &str) -> Vec<UserBucket> {
        match self.grouping(GroupingKind::User) {
            Some(grouping) => search_users(grouping.users(), query)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    fn counts(&mut self, kind: GroupingKind) -> Vec<CountBucket> {
        self.grouping(kind)
            .map(|g| g.counts().to_vec())
            .unwrap_or_default()
    }

    /// Build the full dashboard for the current state; `None` before a load
    pub fn report(&mut self) -> Option<DashboardReport> {
        self.state.dataset.as_ref()?;
        let limits = *self.engine.limits();

        let mut users = self
            .grouping(GroupingKind::User)
            .map(|g| g.users().to_vec())
            .unwrap_or_default();
        let mut teachers = self
            .grouping(GroupingKind::Teacher)
            .map(|g| g.tallies().to_vec())
            .unwrap_or_default();
        let mut blocks = self
            .grouping(GroupingKind::Block)
            .map(|g| g.tallies().to_vec())
            .unwrap_or_default();
        let mut categories = self.counts(GroupingKind::Category);
        let mut courses = self.counts(GroupingKind::Course);
        let timeline = self.counts(GroupingKind::Date);
        let vocabulary = self.counts(GroupingKind::Vocabulary);

        let state = &self.state;
        let dataset = state.dataset.as_ref()?;
        let records = self.filtered();
        let scorer = self.engine.scorer();

        let engagement = Engagement::compute(&users);

        rank_by(&mut users, |u| u.tally.value(state.user_sort));
        let user_total = users.len();
        let user_rows: Vec<UserRow> = users.iter().take(limits.users).map(UserRow::from).collect();

        rank_by(&mut teachers, |b| b.value(state.teacher_sort));
        let per_page = limits.teachers_per_page.max(1);
        let pages = teachers.len().div_ceil(per_page);
        let page = state.teacher_page.min(pages.saturating_sub(1));
        let teacher_total = teachers.len();
        let teacher_entries = ranked(
            teachers.into_iter().skip(page * per_page).take(per_page),
            page * per_page + 1,
        );

        rank_by(&mut blocks, |b| b.value(state.block_sort));
        let block_total = blocks.len();
        let block_entries = ranked(blocks.into_iter().take(limits.blocks), 1);

        rank_by(&mut categories, |c| c.count);
        categories.truncate(limits.categories);
        rank_by(&mut courses, |c| c.count);
        courses.truncate(limits.courses);

        let report = DashboardReport {
            source: dataset.source.clone(),
            filter: state.filter.clone(),
            filter_label: state.filter.label().to_string(),
            scope: state.filter.scope_line(records.len(), dataset.total()),
            total_records: dataset.total(),
            filtered_records: records.len(),
            stats: BasicStats::compute(&records),
            sentiment: SentimentView::new(scorer.summarize(&records)),
            improvement: ImprovementSummary::compute(
                &records,
                scorer,
                limits.improvement_categories,
                limits.improvement_keywords,
            ),
            teachers: TeacherPage {
                sort: state.teacher_sort,
                page,
                pages,
                total: teacher_total,
                entries: teacher_entries,
            },
            blocks: Ranking {
                sort: state.block_sort,
                total: block_total,
                entries: block_entries,
            },
            categories,
            courses,
            timeline,
            keywords: keyword_cloud(&vocabulary, limits.keywords),
            users: UserTable {
                sort: state.user_sort,
                total: user_total,
                entries: user_rows,
            },
            engagement,
        };
        debug!(
            filter = %report.filter,
            records = report.filtered_records,
            "report built"
        );
        Some(report)
    }
}
