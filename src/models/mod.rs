pub mod article;
pub mod category;
pub mod comment;
pub mod user;

pub use article::{Article, ArticleListResponse, ArticleResponse, ArticleRow, TopArticleInfo};
pub use category::{Category, CategoryInfo};
pub use comment::{CommentListResponse, CommentResponse, CommentRow};
pub use user::User;
