pub mod aggregate;
pub mod collector;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod pagination;
pub(crate) mod rate_limit;
pub mod retailers;
pub mod traversal;

pub use aggregate::{run, ProductCollection, RetailerOutcome, RetailerReport};
pub use collector::{Collector, Harvest, PageHarvest};
pub use error::{ExtractionFailure, ScraperError};
pub use extract::{CatalogExtractor, Fragment, Level, ListingMode, PageStrategy, RawRecord};
pub use fetch::{
    ensure_reachable, with_browser_session, BrowserSession, Document, FetchRequest, Fetcher,
    HttpFetcher, WebDriverSettings,
};
pub use normalize::{merge, normalize, PriceField, RetailerSchema, SaleRule};
pub use retailers::{capabilities_of, CollectSettings, Site};
pub use traversal::{CatalogWalker, CategoryBranch, Discovery, TraversalCursor};
