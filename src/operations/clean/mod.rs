mod remove_duplicates;
mod small_angles;

pub use remove_duplicates::RemoveDuplicates;
pub use small_angles::CleanSmallAngles;
