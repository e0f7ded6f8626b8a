// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::input::{PasteHub, PasteSubscription};
use crate::Session;

/// A converter view that owns a session.
///
/// Cloning produces a handle to the same session.
#[derive(Clone, Debug, Default)]
pub struct View {
    session: Rc<RefCell<Session>>,
}

impl View {
    /// Creates a view.
    pub fn new(session: Session) -> Self {
        View {
            session: Rc::new(RefCell::new(session)),
        }
    }

    /// Borrows the session.
    pub fn session(&self) -> Ref<Session> {
        self.session.borrow()
    }

    /// Mutably borrows the session.
    pub fn session_mut(&self) -> RefMut<Session> {
        self.session.borrow_mut()
    }

    /// Starts receiving paste events from `hub`.
    ///
    /// Events are received until the returned value is dropped
    /// or [`MountedView::unmount`] is called.
    #[must_use]
    pub fn mount(&self, hub: &PasteHub) -> MountedView {
        let session = Rc::downgrade(&self.session);
        let subscription = hub.subscribe(move |payload| {
            let session = match session.upgrade() {
                Some(v) => v,
                None => return,
            };

            let result = session.try_borrow_mut();
            match result {
                Ok(mut session) => session.on_paste(payload),
                Err(_) => log::warn!("Paste event ignored because the session is busy."),
            };
        });

        MountedView {
            view: self.clone(),
            subscription,
        }
    }
}

/// A view that receives paste events.
#[derive(Debug)]
pub struct MountedView {
    view: View,
    subscription: PasteSubscription,
}

impl MountedView {
    /// Returns the view.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Stops receiving paste events.
    pub fn unmount(self) -> View {
        self.subscription.dispose();
        self.view
    }
}

impl std::ops::Deref for MountedView {
    type Target = View;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}
