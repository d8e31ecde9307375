use eau2_frame::Rower;
use eau2_value::Row;

use crate::set::Set;

/// Walked over a `pid x uid x uid` commits frame (author, committer omitted): marks a project as
/// newly tagged whenever a commit's author is already a collaborator, recording the delta
/// separately from the running project set so it can be merged across nodes before being folded
/// in (grounded on `ProjectsTagger` in `tests/client/linus_demo.cpp`).
pub struct ProjectsTagger {
    pub u_set: Set,
    pub p_set: Set,
    pub new_projects: Set,
}

impl Rower for ProjectsTagger {
    fn accept(&mut self, row: &mut Row) -> bool {
        let pid = row.get_int(0) as usize;
        let uid = row.get_int(1) as usize;
        if self.u_set.test(uid) && !self.p_set.test(pid) {
            self.p_set.set(pid);
            self.new_projects.set(pid);
        }
        false
    }

    fn clone_for_fork(&self) -> Self {
        ProjectsTagger {
            u_set: self.u_set.clone(),
            p_set: self.p_set.clone(),
            new_projects: Set::new(self.new_projects.len()),
        }
    }

    fn join(&mut self, other: Self) {
        self.new_projects.union_(&other.new_projects);
    }
}

/// The mirror image of [`ProjectsTagger`]: marks a user as newly tagged whenever they committed
/// to a project that was just tagged as a collaborator's.
pub struct UsersTagger {
    pub p_set: Set,
    pub u_set: Set,
    pub new_users: Set,
}

impl Rower for UsersTagger {
    fn accept(&mut self, row: &mut Row) -> bool {
        let pid = row.get_int(0) as usize;
        let uid = row.get_int(1) as usize;
        if self.p_set.test(pid) && !self.u_set.test(uid) {
            self.u_set.set(uid);
            self.new_users.set(uid);
        }
        false
    }

    fn clone_for_fork(&self) -> Self {
        UsersTagger {
            p_set: self.p_set.clone(),
            u_set: self.u_set.clone(),
            new_users: Set::new(self.new_users.len()),
        }
    }

    fn join(&mut self, other: Self) {
        self.new_users.union_(&other.new_users);
    }
}
